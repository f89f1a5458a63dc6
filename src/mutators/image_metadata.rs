// ABOUTME: Analysis cache reads and writes keyed by file content hash
// ABOUTME: Saving an existing hash replaces the result and bumps its version

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde_json::json;

use crate::entities::image::ImageType;
use crate::entities::image_metadata;
use crate::error::Result;
use crate::metadata::AnalysisResult;
use crate::schema::ImageMetadataInput;
use crate::utils::new_record_id;
use crate::validation::validate;

pub struct ImageMetadataMutator<'a, C> {
    db: &'a C,
}

impl<'a, C> ImageMetadataMutator<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_hash(&self, file_hash: &str) -> Result<Option<image_metadata::Model>> {
        let found = image_metadata::Entity::find()
            .filter(image_metadata::Column::FileHash.eq(file_hash))
            .one(self.db)
            .await?;

        Ok(found)
    }

    pub async fn save_metadata(
        &self,
        file_hash: &str,
        result: &AnalysisResult,
        image_type: ImageType,
    ) -> Result<image_metadata::Model> {
        let input: ImageMetadataInput = validate(&json!({
            "file_hash": file_hash,
            "metadata": result,
            "image_type": image_type,
        }))?;

        let now = chrono::Utc::now().timestamp();

        let saved = match self.find_by_hash(&input.file_hash).await? {
            Some(existing) => {
                let version = existing.version + 1;
                let mut active = existing.into_active_model();
                active.metadata = Set(input.metadata);
                active.image_type = Set(input.image_type);
                active.version = Set(version);
                active.updated_at = Set(now);
                active.update(self.db).await?
            }
            None => {
                image_metadata::ActiveModel {
                    id: Set(new_record_id()),
                    file_hash: Set(input.file_hash),
                    metadata: Set(input.metadata),
                    version: Set(input.version),
                    image_type: Set(input.image_type),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(self.db)
                .await?
            }
        };

        tracing::debug!(
            file_hash = %short_hash(&saved.file_hash),
            version = saved.version,
            "Saved analysis metadata"
        );
        Ok(saved)
    }
}

pub fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
