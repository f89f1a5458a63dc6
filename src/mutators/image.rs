// ABOUTME: Image uploads, status changes and image-history lookups for one owner
// ABOUTME: Upload order is: check user, validate, hash, write blob, insert row

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use std::collections::HashSet;

use super::require_user;
use crate::blobs::BlobStore;
use crate::entities::image::{AnalysisStatus, ImageType};
use crate::entities::{container, container_image, image, item, item_image};
use crate::error::{AppError, Result};
use crate::schema::{ImageInput, ImageUpdate, ImageUpload};
use crate::utils::{compute_file_hash, new_record_id, sanitize_file_name};
use crate::validation::validate;

const STATUS_LIST_LIMIT: u64 = 100;

pub struct ImageMutator<'a, C> {
    db: &'a C,
    blobs: &'a BlobStore,
    user_id: &'a str,
}

impl<'a, C> ImageMutator<'a, C>
where
    C: ConnectionTrait + TransactionTrait,
{
    pub fn new(db: &'a C, blobs: &'a BlobStore, user_id: &'a str) -> Self {
        Self { db, blobs, user_id }
    }

    /// Stores an uploaded image for the acting user.
    ///
    /// An empty user id fails before validation, hashing or any write.
    pub async fn upload_image(
        &self,
        upload: ImageUpload,
        image_type: Option<ImageType>,
    ) -> Result<image::Model> {
        require_user(self.user_id)?;
        let input = ImageInput::new(upload, image_type)?;

        let file_hash = compute_file_hash(&input.upload.bytes);
        let id = new_record_id();
        let file = sanitize_file_name(&input.upload.file_name);

        self.blobs.put(&id, &file, &input.upload.bytes).await?;

        let now = chrono::Utc::now().timestamp();
        let inserted = image::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(self.user_id.to_string()),
            file: Set(file),
            original_name: Set(input.upload.file_name.clone()),
            content_type: Set(input.upload.content_type.clone()),
            size: Set(input.upload.bytes.len() as i64),
            file_hash: Set(Some(file_hash)),
            image_type: Set(input.image_type),
            analysis_status: Set(input.analysis_status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await;

        match inserted {
            Ok(model) => {
                tracing::info!(image_id = %model.id, size = model.size, "Uploaded image");
                Ok(model)
            }
            Err(e) => {
                // The row never existed, so the blob is unreachable
                if let Err(cleanup) = self.blobs.delete(&id).await {
                    tracing::warn!(image_id = %id, "Failed to remove orphaned blob: {}", cleanup);
                }
                Err(e.into())
            }
        }
    }

    pub async fn update(&self, id: &str, input: &Value) -> Result<image::Model> {
        let update: ImageUpdate = validate(input)?;
        self.apply(id, update).await
    }

    pub async fn apply(&self, id: &str, update: ImageUpdate) -> Result<image::Model> {
        let current = self.get_by_id(id).await?;

        let mut active = current.into_active_model();
        if let Some(image_type) = update.image_type {
            active.image_type = Set(image_type);
        }
        if let Some(status) = update.analysis_status {
            active.analysis_status = Set(status);
        }
        active.updated_at = Set(chrono::Utc::now().timestamp());

        Ok(active.update(self.db).await?)
    }

    pub async fn update_analysis_status(&self, id: &str, status: AnalysisStatus) -> Result<image::Model> {
        tracing::debug!(image_id = id, ?status, "Setting analysis status");
        self.apply(
            id,
            ImageUpdate {
                analysis_status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<image::Model> {
        image::Entity::find_by_id(id.to_string())
            .filter(image::Column::UserId.eq(self.user_id))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image with ID {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<image::Model>> {
        let images = image::Entity::find()
            .filter(image::Column::UserId.eq(self.user_id))
            .order_by_desc(image::Column::CreatedAt)
            .all(self.db)
            .await?;

        Ok(images)
    }

    pub async fn list_by_analysis_status(&self, status: AnalysisStatus) -> Result<Vec<image::Model>> {
        let images = image::Entity::find()
            .filter(image::Column::UserId.eq(self.user_id))
            .filter(image::Column::AnalysisStatus.eq(status))
            .order_by_desc(image::Column::CreatedAt)
            .limit(STATUS_LIST_LIMIT)
            .all(self.db)
            .await?;

        Ok(images)
    }

    /// The item's current primary image first, then every archived image, newest first,
    /// each image at most once.
    pub async fn list_for_item(&self, item_id: &str) -> Result<Vec<image::Model>> {
        let owner = item::Entity::find_by_id(item_id.to_string())
            .filter(item::Column::UserId.eq(self.user_id))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", item_id)))?;

        let mapped: Vec<String> = item_image::Entity::find()
            .filter(item_image::Column::ItemId.eq(item_id))
            .order_by_desc(item_image::Column::CreatedAt)
            .all(self.db)
            .await?
            .into_iter()
            .map(|m| m.image_id)
            .collect();

        self.collect_images(owner.primary_image, mapped).await
    }

    pub async fn list_for_container(&self, container_id: &str) -> Result<Vec<image::Model>> {
        let owner = container::Entity::find_by_id(container_id.to_string())
            .filter(container::Column::UserId.eq(self.user_id))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Container {} not found", container_id)))?;

        let mapped: Vec<String> = container_image::Entity::find()
            .filter(container_image::Column::ContainerId.eq(container_id))
            .order_by_desc(container_image::Column::CreatedAt)
            .all(self.db)
            .await?
            .into_iter()
            .map(|m| m.image_id)
            .collect();

        self.collect_images(owner.primary_image, mapped).await
    }

    async fn collect_images(&self, primary: Option<String>, mapped: Vec<String>) -> Result<Vec<image::Model>> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for image_id in primary.into_iter().chain(mapped) {
            if !seen.insert(image_id.clone()) {
                continue;
            }
            match self.get_by_id(&image_id).await {
                Ok(image) => images.push(image),
                Err(AppError::NotFound(_)) => {
                    tracing::warn!(image_id = %image_id, "Mapped image is missing, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(images)
    }

    pub async fn read_file(&self, image: &image::Model) -> Result<Vec<u8>> {
        self.blobs.get(&image.id, &image.file).await
    }

    /// Deletes the row, then the blob. Mappings cascade; primary image references are cleared.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let current = self.get_by_id(id).await?;

        image::Entity::delete_by_id(current.id.clone())
            .exec(self.db)
            .await?;
        self.blobs.delete(&current.id).await?;

        tracing::info!(image_id = %current.id, "Deleted image");
        Ok(())
    }
}
