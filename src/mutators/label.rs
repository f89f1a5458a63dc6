// ABOUTME: Label record creation

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;

use crate::entities::label;
use crate::error::Result;
use crate::schema::LabelInput;
use crate::utils::new_record_id;
use crate::validation::validate;

pub struct LabelMutator<'a, C> {
    db: &'a C,
}

impl<'a, C> LabelMutator<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &Value) -> Result<label::Model> {
        let input: LabelInput = validate(input)?;

        let model = label::ActiveModel {
            id: Set(new_record_id()),
            item_id: Set(input.item_id),
            container_id: Set(input.container_id),
            format: Set(input.format),
            data: Set(input.data),
            created_at: Set(chrono::Utc::now().timestamp()),
        }
        .insert(self.db)
        .await?;

        Ok(model)
    }
}
