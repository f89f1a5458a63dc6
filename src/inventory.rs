// ABOUTME: Image-to-inventory pipeline: upload, analyze (or reuse cached analysis), create records
// ABOUTME: Any failure after the image exists marks it failed before the error is returned

use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;

use crate::analysis::{ImageAnalyzer, ImagePayload};
use crate::blobs::BlobStore;
use crate::entities::image::AnalysisStatus;
use crate::entities::{container, image, item};
use crate::error::{AppError, Result};
use crate::metadata::{AnalysisResult, CategoryLibrary, ItemMetadata};
use crate::mutators::image_metadata::short_hash;
use crate::mutators::{ContainerMutator, ImageMetadataMutator, ImageMutator, ItemMutator};
use crate::schema::{ContainerInput, ImageUpdate, ImageUpload, ItemInput};
use crate::utils::{compute_file_hash, slugify};

#[derive(Debug, Clone, Serialize)]
pub struct ProcessImageResult {
    pub image: image::Model,
    pub result: AnalysisResult,
    pub items: Vec<item::Model>,
    pub container: Option<container::Model>,
}

/// Whether records already built from this image are refreshed or always created anew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existing {
    Create,
    Refresh,
}

pub struct InventoryService<'a, C> {
    db: &'a C,
    blobs: &'a BlobStore,
    analyzer: Option<&'a dyn ImageAnalyzer>,
    user_id: &'a str,
}

impl<'a, C> InventoryService<'a, C>
where
    C: ConnectionTrait + TransactionTrait,
{
    pub fn new(
        db: &'a C,
        blobs: &'a BlobStore,
        analyzer: Option<&'a dyn ImageAnalyzer>,
        user_id: &'a str,
    ) -> Self {
        Self {
            db,
            blobs,
            analyzer,
            user_id,
        }
    }

    fn images(&self) -> ImageMutator<'a, C> {
        ImageMutator::new(self.db, self.blobs, self.user_id)
    }

    fn items(&self) -> ItemMutator<'a, C> {
        ItemMutator::new(self.db, self.user_id)
    }

    fn containers(&self) -> ContainerMutator<'a, C> {
        ContainerMutator::new(self.db, self.user_id)
    }

    /// Categories offered to the analyzer: the owner's own values, capped, with built-in
    /// examples standing in for any list that is still empty.
    pub async fn category_library(&self) -> Result<CategoryLibrary> {
        let existing = self.items().distinct_categories().await?;
        Ok(prompt_categories(existing))
    }

    /// Stores a new upload, then analyzes it (or reuses a cached analysis of identical bytes)
    /// and creates the item, or the container with its items.
    pub async fn process_image_upload(&self, upload: ImageUpload) -> Result<ProcessImageResult> {
        let file_hash = compute_file_hash(&upload.bytes);
        let cached = ImageMetadataMutator::new(self.db)
            .find_by_hash(&file_hash)
            .await?
            .map(|entry| entry.metadata);

        let payload = ImagePayload {
            content_type: upload.content_type.clone(),
            bytes: upload.bytes.clone(),
        };
        let image = self.images().upload_image(upload, None).await?;

        let pipeline =
            self.analyze_and_record(&image, &payload, &file_hash, cached, Existing::Create);
        self.finish_or_fail(&image, pipeline).await
    }

    /// Runs the pipeline for an image that is already stored. Records previously built from
    /// this image are updated in place; container contents are always created.
    pub async fn process_existing_image(&self, image_id: &str) -> Result<ProcessImageResult> {
        let image = self.images().get_by_id(image_id).await?;
        let bytes = self.images().read_file(&image).await?;
        let file_hash = image
            .file_hash
            .clone()
            .unwrap_or_else(|| compute_file_hash(&bytes));

        let payload = ImagePayload {
            content_type: image.content_type.clone(),
            bytes,
        };

        let pipeline = async {
            let cached = ImageMetadataMutator::new(self.db)
                .find_by_hash(&file_hash)
                .await?
                .map(|entry| entry.metadata);
            self.analyze_and_record(&image, &payload, &file_hash, cached, Existing::Refresh)
                .await
        };

        self.finish_or_fail(&image, pipeline).await
    }

    /// Analyzes a stored image afresh without touching any records or the cache.
    pub async fn reanalyze_image(&self, image_id: &str) -> Result<AnalysisResult> {
        let image = self.images().get_by_id(image_id).await?;
        let payload = ImagePayload {
            content_type: image.content_type.clone(),
            bytes: self.images().read_file(&image).await?,
        };

        let categories = self.category_library().await?;
        self.analyzer()?.analyze(&payload, &categories).await
    }

    fn analyzer(&self) -> Result<&'a dyn ImageAnalyzer> {
        self.analyzer
            .ok_or_else(|| AppError::ExternalService("AI analysis is not configured".to_string()))
    }

    async fn finish_or_fail<F>(&self, image: &image::Model, pipeline: F) -> Result<ProcessImageResult>
    where
        F: std::future::Future<Output = Result<ProcessImageResult>>,
    {
        match pipeline.await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(image_id = %image.id, "Image processing failed: {}", e);
                if let Err(status_err) = self
                    .images()
                    .update_analysis_status(&image.id, AnalysisStatus::Failed)
                    .await
                {
                    tracing::error!(image_id = %image.id, "Failed to mark image as failed: {}", status_err);
                }
                Err(e)
            }
        }
    }

    async fn analyze_and_record(
        &self,
        image: &image::Model,
        payload: &ImagePayload,
        file_hash: &str,
        cached: Option<AnalysisResult>,
        existing: Existing,
    ) -> Result<ProcessImageResult> {
        let (result, fresh) = match cached {
            Some(result) => {
                tracing::info!(file_hash = %short_hash(file_hash), "Analysis cache hit");
                (result, false)
            }
            None => {
                tracing::info!(file_hash = %short_hash(file_hash), "Analysis cache miss, calling analyzer");
                let analyzer = self.analyzer()?;
                let categories = self.category_library().await?;

                self.images()
                    .update_analysis_status(&image.id, AnalysisStatus::Processing)
                    .await?;

                (analyzer.analyze(payload, &categories).await?, true)
            }
        };

        let (items, container) = self
            .record(&result, &image.id, existing)
            .await
            .map_err(unusable_analysis)?;

        // Only cache results that produced records, so a bad analysis is retried next time
        if fresh {
            ImageMetadataMutator::new(self.db)
                .save_metadata(file_hash, &result, result.image_type())
                .await?;
        }

        let image = self
            .images()
            .apply(
                &image.id,
                ImageUpdate {
                    image_type: Some(result.image_type()),
                    analysis_status: Some(AnalysisStatus::Completed),
                },
            )
            .await?;

        tracing::info!(
            image_id = %image.id,
            image_type = ?image.image_type,
            items = items.len(),
            "Processed image"
        );

        Ok(ProcessImageResult {
            image,
            result,
            items,
            container,
        })
    }

    async fn record(
        &self,
        result: &AnalysisResult,
        image_id: &str,
        existing: Existing,
    ) -> Result<(Vec<item::Model>, Option<container::Model>)> {
        match result {
            AnalysisResult::Item(data) => {
                let input = item_input(&data.item, None, image_id);
                let item = self.upsert_item(input, image_id, existing).await?;
                Ok((vec![item], None))
            }
            AnalysisResult::Container(data) => {
                let input = ContainerInput {
                    container_label: data.container.container_label.clone(),
                    container_notes: data.container.container_notes.clone(),
                    primary_image: Some(image_id.to_string()),
                    primary_image_bbox: None,
                };
                let saved = self.upsert_container(input, image_id, existing).await?;

                let mut items = Vec::new();
                for metadata in &data.container.container_items {
                    let input = item_input(metadata, Some(&saved.id), image_id);
                    items.push(self.upsert_contained_item(input, &saved.id, existing).await?);
                }
                Ok((items, Some(saved)))
            }
        }
    }

    async fn upsert_item(&self, input: ItemInput, image_id: &str, existing: Existing) -> Result<item::Model> {
        let payload = serde_json::to_value(&input)?;

        if existing == Existing::Refresh {
            if let Some(current) = self.items().find_by_primary_image(image_id).await? {
                return self.items().update(&current.id, &payload).await;
            }
        }
        self.items().create(&payload).await
    }

    /// Contained items are recognised by label within the container.
    async fn upsert_contained_item(
        &self,
        input: ItemInput,
        container_id: &str,
        existing: Existing,
    ) -> Result<item::Model> {
        let payload = serde_json::to_value(&input)?;

        if existing == Existing::Refresh {
            if let Some(current) = self
                .items()
                .find_in_container(container_id, &input.item_label)
                .await?
            {
                return self.items().update(&current.id, &payload).await;
            }
        }
        self.items().create(&payload).await
    }

    async fn upsert_container(
        &self,
        input: ContainerInput,
        image_id: &str,
        existing: Existing,
    ) -> Result<container::Model> {
        let payload = serde_json::to_value(&input)?;

        if existing == Existing::Refresh {
            if let Some(current) = self.containers().find_by_primary_image(image_id).await? {
                return self.containers().update(&current.id, &payload).await;
            }
        }
        self.containers().create(&payload).await
    }
}

const DEFAULT_FUNCTIONAL: &[&str] = &[
    "Tools", "Electronics", "Materials", "Technology", "Office",
    "Furniture", "Kitchen", "Outdoor", "Automotive", "Hardware",
];
const DEFAULT_SPECIFIC: &[&str] = &[
    "Power Tools", "Hand Tools", "Computer Components", "Fasteners", "Sensors",
    "Lab Equipment", "Stationary", "Kitchenware", "Gardening", "Safety Gear",
];
const DEFAULT_ITEM_TYPES: &[&str] = &[
    "Drill", "Screwdriver", "CPU Heatsink", "Screws", "Proximity Sensor",
    "Oscilloscope", "Pen", "Plate", "Shovel", "Safety Glasses",
];
const PROMPT_CATEGORY_LIMIT: usize = 10;

fn prompt_categories(existing: CategoryLibrary) -> CategoryLibrary {
    fn pick(values: Vec<String>, defaults: &[&str]) -> Vec<String> {
        if values.is_empty() {
            defaults.iter().map(|d| d.to_string()).collect()
        } else {
            values.into_iter().take(PROMPT_CATEGORY_LIMIT).collect()
        }
    }

    CategoryLibrary {
        functional: pick(existing.functional, DEFAULT_FUNCTIONAL),
        specific: pick(existing.specific, DEFAULT_SPECIFIC),
        item_type: pick(existing.item_type, DEFAULT_ITEM_TYPES),
    }
}

/// Records the analyzer asked for but validation refused are a bad analysis, not a bad request.
fn unusable_analysis(err: AppError) -> AppError {
    match err {
        AppError::Validation(errors) => {
            AppError::ExternalService(format!("Analyzer returned unusable metadata: {}", errors))
        }
        other => other,
    }
}

/// Near-duplicate analyzer categories ("Tools!" vs "Tools") share one slug. A name made only
/// of symbols has no slug and is kept as given.
fn category_name(raw: &str) -> String {
    let slug = slugify(raw);
    if slug.is_empty() {
        raw.trim().to_string()
    } else {
        slug
    }
}

fn item_input(metadata: &ItemMetadata, container: Option<&str>, image_id: &str) -> ItemInput {
    ItemInput {
        item_label: metadata.item_label.clone(),
        item_notes: metadata.item_notes.clone(),
        category_functional: category_name(&metadata.category_functional),
        category_specific: category_name(&metadata.category_specific),
        item_type: metadata.item_type.clone(),
        item_manufacturer: metadata.item_manufacturer.clone(),
        item_attributes: metadata.item_attributes.clone(),
        container: container.map(str::to_string),
        primary_image: Some(image_id.to_string()),
        primary_image_bbox: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_categories_fill_empty_lists() {
        let library = prompt_categories(CategoryLibrary::default());
        assert_eq!(library.functional.len(), PROMPT_CATEGORY_LIMIT);
        assert_eq!(library.functional[0], "Tools");
        assert_eq!(library.specific[0], "Power Tools");
        assert_eq!(library.item_type[0], "Drill");
    }

    #[test]
    fn test_prompt_categories_cap_existing_values() {
        let many: Vec<String> = (0..25).map(|n| format!("Category {:02}", n)).collect();
        let library = prompt_categories(CategoryLibrary {
            functional: many.clone(),
            specific: vec!["Fasteners".to_string()],
            item_type: Vec::new(),
        });

        assert_eq!(library.functional, many[..PROMPT_CATEGORY_LIMIT].to_vec());
        assert_eq!(library.specific, vec!["Fasteners".to_string()]);
        assert_eq!(library.item_type.len(), DEFAULT_ITEM_TYPES.len());
    }

    #[test]
    fn test_category_name_keeps_symbol_only_names() {
        assert_eq!(category_name("Electronics & Materials!"), "Electronics Materials");
        assert_eq!(category_name(" & "), "&");
        assert_eq!(category_name(""), "");
    }

    #[test]
    fn test_unusable_analysis_maps_only_validation() {
        let errors = crate::validation::ValidationErrors::single(
            "item_label",
            crate::validation::ViolationKind::Required,
            "Item label is required",
        );
        assert!(matches!(
            unusable_analysis(AppError::Validation(errors)),
            AppError::ExternalService(_)
        ));
        assert!(matches!(
            unusable_analysis(AppError::NotFound("x".to_string())),
            AppError::NotFound(_)
        ));
    }
}
