// ABOUTME: Image entity for uploaded photos, their content hash and analysis state
// ABOUTME: image_type and analysis_status are stored as lowercase strings

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[sea_orm(string_value = "item")]
    Item,
    #[sea_orm(string_value = "container")]
    Container,
    #[sea_orm(string_value = "unprocessed")]
    Unprocessed,
}

impl ImageType {
    pub const ALLOWED: &'static [&'static str] = &["item", "container", "unprocessed"];
}

/// Free-form progress label; callers move it between states, nothing enforces an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl AnalysisStatus {
    pub const ALLOWED: &'static [&'static str] = &["pending", "processing", "completed", "failed"];
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    /// Stored blob name, relative to the image's directory in the blob store.
    pub file: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub file_hash: Option<String>,
    pub image_type: ImageType,
    pub analysis_status: AnalysisStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::item_image::Entity")]
    ItemImages,
    #[sea_orm(has_many = "super::container_image::Entity")]
    ContainerImages,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::item_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemImages.def()
    }
}

impl Related<super::container_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContainerImages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
