// ABOUTME: Item entity for individual inventory objects and their three-tier categories
// ABOUTME: Attributes and the primary image crop box are stored as JSON columns

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::metadata::{BoundingBox, ItemAttributes};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub item_label: String,
    pub item_notes: String,
    pub category_functional: String,
    pub category_specific: String,
    pub item_type: String,
    pub item_manufacturer: String,
    #[sea_orm(column_type = "Json")]
    pub item_attributes: ItemAttributes,
    pub container: Option<String>,
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
        belongs_to = "super::container::Entity",
        from = "Column::Container",
        to = "super::container::Column::Id",
        on_delete = "SetNull"
    )]
    Container,
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::PrimaryImage",
        to = "super::image::Column::Id",
        on_delete = "SetNull"
    )]
    PrimaryImage,
    #[sea_orm(has_many = "super::item_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::item_record::Entity")]
    Records,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::container::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Container.def()
    }
}

impl Related<super::item_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::item_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
