// ABOUTME: Response bodies and query parameters for the HTTP API
// ABOUTME: Route-level bodies use camelCase keys; entity records keep their snake_case columns

use serde::{Deserialize, Serialize};

use crate::entities::{container, image, item, user};
use crate::inventory::ProcessImageResult;
use crate::metadata::AnalysisResult;
use crate::mutators::ItemFilters;

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: user::Model,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(rename = "isAIEnabled")]
    pub is_ai_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Outcome of running the image pipeline, as returned by analyze-image and process-image.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub image: image::Model,
    pub result: AnalysisResult,
    pub items: Vec<item::Model>,
    pub container: Option<container::Model>,
}

impl From<ProcessImageResult> for AnalyzeResponse {
    fn from(processed: ProcessImageResult) -> Self {
        Self {
            success: true,
            image: processed.image,
            result: processed.result,
            items: processed.items,
            container: processed.container,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelResponse {
    pub svg: String,
    pub label_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(flatten)]
    pub filters: ItemFilters,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageListQuery {
    pub status: Option<String>,
}
