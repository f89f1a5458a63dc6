// ABOUTME: Container writes and queries scoped to one owner
// ABOUTME: Mirrors item history handling: create snapshots, per-field updates, archived images

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;

use super::{contains_pattern, history, require_user};
use crate::entities::{container, container_record, image};
use crate::error::{AppError, Result};
use crate::schema::{ContainerInput, ContainerUpdate};
use crate::utils::new_record_id;
use crate::validation::validate;

const SEARCH_LIMIT: u64 = 500;

pub struct ContainerMutator<'a, C> {
    db: &'a C,
    user_id: &'a str,
}

impl<'a, C> ContainerMutator<'a, C>
where
    C: ConnectionTrait + TransactionTrait,
{
    pub fn new(db: &'a C, user_id: &'a str) -> Self {
        Self { db, user_id }
    }

    pub async fn create(&self, input: &Value) -> Result<container::Model> {
        require_user(self.user_id)?;
        let input: ContainerInput = validate(input)?;
        self.insert(input).await
    }

    pub async fn insert(&self, input: ContainerInput) -> Result<container::Model> {
        require_user(self.user_id)?;
        self.check_image(input.primary_image.as_deref()).await?;

        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await?;

        let model = container::ActiveModel {
            id: Set(new_record_id()),
            user_id: Set(self.user_id.to_string()),
            container_label: Set(input.container_label),
            container_notes: Set(input.container_notes),
            primary_image: Set(input.primary_image),
            primary_image_bbox: Set(input.primary_image_bbox),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        history::container_created(&txn, &model.id, self.user_id, &model).await?;
        if let Some(image_id) = &model.primary_image {
            history::map_container_image(&txn, &model.id, image_id, model.primary_image_bbox)
                .await?;
        }

        txn.commit().await?;
        tracing::info!(container_id = %model.id, "Created container");
        Ok(model)
    }

    pub async fn update(&self, id: &str, input: &Value) -> Result<container::Model> {
        let update: ContainerUpdate = validate(input)?;
        self.apply(id, update).await
    }

    pub async fn apply(&self, id: &str, update: ContainerUpdate) -> Result<container::Model> {
        let current = self.get_by_id(id).await?;

        let primary_image = update.primary_image.map(|p| Some(p).filter(|p| !p.is_empty()));
        self.check_image(primary_image.clone().flatten().as_deref()).await?;

        let mut active = current.clone().into_active_model();
        if let Some(v) = update.container_label {
            active.container_label = Set(v);
        }
        if let Some(v) = update.container_notes {
            active.container_notes = Set(v);
        }
        if let Some(v) = primary_image {
            active.primary_image = Set(v);
        }
        if let Some(v) = update.primary_image_bbox {
            active.primary_image_bbox = Set(Some(v));
        }
        active.updated_at = Set(chrono::Utc::now().timestamp());

        let txn = self.db.begin().await?;
        let updated = active.update(&txn).await?;

        let changes = history::diff(&current, &updated)?;
        history::container_updated(&txn, &updated.id, self.user_id, &changes).await?;

        if let Some(old_image) = &current.primary_image {
            if updated.primary_image.as_ref() != Some(old_image) {
                history::map_container_image(&txn, &updated.id, old_image, current.primary_image_bbox)
                    .await?;
            }
        }

        txn.commit().await?;
        tracing::info!(container_id = %updated.id, changed = changes.len(), "Updated container");
        Ok(updated)
    }

    /// Removes the container. Items inside keep existing with their container cleared.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let current = self.get_by_id(id).await?;
        container::Entity::delete_by_id(current.id.clone())
            .exec(self.db)
            .await?;
        tracing::info!(container_id = %current.id, "Deleted container");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<container::Model> {
        container::Entity::find_by_id(id.to_string())
            .filter(container::Column::UserId.eq(self.user_id))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Container {} not found", id)))
    }

    pub async fn find_by_primary_image(&self, image_id: &str) -> Result<Option<container::Model>> {
        let found = container::Entity::find()
            .filter(container::Column::UserId.eq(self.user_id))
            .filter(container::Column::PrimaryImage.eq(image_id))
            .one(self.db)
            .await?;

        Ok(found)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<container::Model>> {
        let mut condition = Condition::all().add(container::Column::UserId.eq(self.user_id));

        let query = query.trim();
        if !query.is_empty() {
            condition = condition.add(
                Condition::any()
                    .add(container::Column::ContainerLabel.like(contains_pattern(query)))
                    .add(container::Column::ContainerNotes.like(contains_pattern(query))),
            );
        }

        let containers = container::Entity::find()
            .filter(condition)
            .order_by_desc(container::Column::CreatedAt)
            .limit(SEARCH_LIMIT)
            .all(self.db)
            .await?;

        Ok(containers)
    }

    pub async fn history(&self, id: &str) -> Result<Vec<container_record::Model>> {
        let current = self.get_by_id(id).await?;

        let records = container_record::Entity::find()
            .filter(container_record::Column::ContainerId.eq(current.id))
            .order_by_asc(container_record::Column::CreatedAt)
            .all(self.db)
            .await?;

        Ok(records)
    }

    async fn check_image(&self, image_id: Option<&str>) -> Result<()> {
        let Some(image_id) = image_id else {
            return Ok(());
        };

        let owned = image::Entity::find_by_id(image_id.to_string())
            .filter(image::Column::UserId.eq(self.user_id))
            .one(self.db)
            .await?;

        match owned {
            Some(_) => Ok(()),
            None => Err(AppError::BadRequest(format!("Image {} not found", image_id))),
        }
    }
}
