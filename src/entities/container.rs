// ABOUTME: Container entity for boxes, bins and shelves that hold items
// ABOUTME: Tracks a primary image with an optional crop box

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::metadata::BoundingBox;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "containers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub container_label: String,
    pub container_notes: String,
    pub primary_image: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub primary_image_bbox: Option<BoundingBox>,
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
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::PrimaryImage",
        to = "super::image::Column::Id",
        on_delete = "SetNull"
    )]
    PrimaryImage,
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
    #[sea_orm(has_many = "super::container_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::container_record::Entity")]
    Records,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::container_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::container_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
