// ABOUTME: Analysis cache keyed by file content hash
// ABOUTME: Identical uploads reuse the stored AnalysisResult instead of re-running analysis

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::image::ImageType;
use crate::metadata::AnalysisResult;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_metadata")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub file_hash: String,
    #[sea_orm(column_type = "Json")]
    pub metadata: AnalysisResult,
    /// Bumped every time the cached result is replaced.
    pub version: i32,
    pub image_type: ImageType,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
