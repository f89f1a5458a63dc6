// ABOUTME: Structured image-analysis payloads and the JSON value types stored on records
// ABOUTME: AnalysisResult is tagged by image type so cached metadata stays self-describing

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::entities::image::ImageType;

/// Sub-region of an image, in pixels of the source image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttribute {
    pub name: String,
    pub value: String,
}

/// Key/value attributes persisted as a JSON array column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ItemAttributes(pub Vec<ItemAttribute>);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub item_label: String,
    #[serde(default)]
    pub item_notes: String,
    #[serde(default)]
    pub category_functional: String,
    #[serde(default)]
    pub category_specific: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub item_manufacturer: String,
    #[serde(default)]
    pub item_attributes: Vec<ItemAttribute>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemImageMetadata {
    #[serde(default)]
    pub image_label: String,
    #[serde(default)]
    pub image_notes: String,
    pub item: ItemMetadata,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub container_label: String,
    #[serde(default)]
    pub container_notes: String,
    #[serde(default)]
    pub container_items: Vec<ItemMetadata>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerImageMetadata {
    #[serde(default)]
    pub image_label: String,
    #[serde(default)]
    pub image_notes: String,
    pub container: ContainerMetadata,
}

/// Result of analysing one image: either a single item or a container holding items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum AnalysisResult {
    Item(ItemImageMetadata),
    Container(ContainerImageMetadata),
}

impl AnalysisResult {
    pub fn image_type(&self) -> ImageType {
        match self {
            AnalysisResult::Item(_) => ImageType::Item,
            AnalysisResult::Container(_) => ImageType::Container,
        }
    }
}

/// Distinct category values already in use, fed back to the analyzer for consistency.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLibrary {
    pub functional: Vec<String>,
    pub specific: Vec<String>,
    pub item_type: Vec<String>,
}

impl CategoryLibrary {
    pub fn prompt_context(&self) -> String {
        fn or_none(values: &[String]) -> String {
            if values.is_empty() {
                "None yet".to_string()
            } else {
                values.join(", ")
            }
        }

        format!(
            "Existing categories for consistency:\n\
             - Functional: {}\n\
             - Specific: {}\n\
             - Item Types: {}\n\n\
             Use existing categories when appropriate, or create new ones if needed.",
            or_none(&self.functional),
            or_none(&self.specific),
            or_none(&self.item_type),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analysis_result_is_tagged_by_type() {
        let value = json!({
            "type": "container",
            "data": {
                "image_label": "Shelf bin",
                "container": {
                    "container_label": "Bin A",
                    "container_items": [
                        { "item_label": "M3 screws", "category_functional": "Hardware" }
                    ]
                }
            }
        });

        let result: AnalysisResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.image_type(), ImageType::Container);

        let AnalysisResult::Container(data) = &result else {
            panic!("expected a container result");
        };
        assert_eq!(data.container.container_items.len(), 1);
        assert_eq!(data.container.container_items[0].item_notes, "");

        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["type"], "container");
    }

    #[test]
    fn test_prompt_context_marks_empty_libraries() {
        let library = CategoryLibrary {
            functional: vec!["Tools".to_string(), "Electronics".to_string()],
            ..Default::default()
        };

        let context = library.prompt_context();
        assert!(context.contains("Functional: Tools, Electronics"));
        assert!(context.contains("Specific: None yet"));
    }
}
