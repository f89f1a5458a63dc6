// ABOUTME: Item writes and queries scoped to one owner
// ABOUTME: Creates and updates record history and image mappings in the same transaction

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::Value;

use super::{contains_pattern, history, require_user};
use crate::entities::{container, image, item, item_record};
use crate::error::{AppError, Result};
use crate::metadata::{CategoryLibrary, ItemAttributes};
use crate::schema::{ItemInput, ItemUpdate};
use crate::utils::new_record_id;
use crate::validation::validate;

const SEARCH_LIMIT: u64 = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilters {
    pub category_functional: Option<String>,
    pub category_specific: Option<String>,
    pub item_type: Option<String>,
    pub container: Option<String>,
}

pub struct ItemMutator<'a, C> {
    db: &'a C,
    user_id: &'a str,
}

impl<'a, C> ItemMutator<'a, C>
where
    C: ConnectionTrait + TransactionTrait,
{
    pub fn new(db: &'a C, user_id: &'a str) -> Self {
        Self { db, user_id }
    }

    pub async fn create(&self, input: &Value) -> Result<item::Model> {
        require_user(self.user_id)?;
        let input: ItemInput = validate(input)?;
        self.insert(input).await
    }

    /// Inserts an already-validated item together with its create record and initial image mapping.
    pub async fn insert(&self, input: ItemInput) -> Result<item::Model> {
        require_user(self.user_id)?;
        self.check_references(input.container.as_deref(), input.primary_image.as_deref())
            .await?;

        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await?;

        let model = item::ActiveModel {
            id: Set(new_record_id()),
            user_id: Set(self.user_id.to_string()),
            item_label: Set(input.item_label),
            item_notes: Set(input.item_notes),
            category_functional: Set(input.category_functional),
            category_specific: Set(input.category_specific),
            item_type: Set(input.item_type),
            item_manufacturer: Set(input.item_manufacturer),
            item_attributes: Set(ItemAttributes(input.item_attributes)),
            container: Set(input.container),
            primary_image: Set(input.primary_image),
            primary_image_bbox: Set(input.primary_image_bbox),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        history::item_created(&txn, &model.id, self.user_id, &model).await?;
        if let Some(image_id) = &model.primary_image {
            history::map_item_image(&txn, &model.id, image_id, model.primary_image_bbox).await?;
        }

        txn.commit().await?;
        tracing::info!(item_id = %model.id, "Created item");
        Ok(model)
    }

    pub async fn update(&self, id: &str, input: &Value) -> Result<item::Model> {
        let update: ItemUpdate = validate(input)?;
        self.apply(id, update).await
    }

    /// Applies a validated change, writing one history row per changed field.
    ///
    /// When the primary image is replaced, the outgoing image and its crop box are archived
    /// as a mapping row so the item's image history stays complete.
    pub async fn apply(&self, id: &str, update: ItemUpdate) -> Result<item::Model> {
        let current = self.get_by_id(id).await?;

        let container = update.container.map(|c| Some(c).filter(|c| !c.is_empty()));
        let primary_image = update.primary_image.map(|p| Some(p).filter(|p| !p.is_empty()));
        self.check_references(
            container.clone().flatten().as_deref(),
            primary_image.clone().flatten().as_deref(),
        )
        .await?;

        let mut active = current.clone().into_active_model();
        if let Some(v) = update.item_label {
            active.item_label = Set(v);
        }
        if let Some(v) = update.item_notes {
            active.item_notes = Set(v);
        }
        if let Some(v) = update.category_functional {
            active.category_functional = Set(v);
        }
        if let Some(v) = update.category_specific {
            active.category_specific = Set(v);
        }
        if let Some(v) = update.item_type {
            active.item_type = Set(v);
        }
        if let Some(v) = update.item_manufacturer {
            active.item_manufacturer = Set(v);
        }
        if let Some(v) = update.item_attributes {
            active.item_attributes = Set(ItemAttributes(v));
        }
        if let Some(v) = container {
            active.container = Set(v);
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
        history::item_updated(&txn, &updated.id, self.user_id, &changes).await?;

        if let Some(old_image) = &current.primary_image {
            if updated.primary_image.as_ref() != Some(old_image) {
                history::map_item_image(&txn, &updated.id, old_image, current.primary_image_bbox)
                    .await?;
            }
        }

        txn.commit().await?;
        tracing::info!(item_id = %updated.id, changed = changes.len(), "Updated item");
        Ok(updated)
    }

    /// Removes the item; history, mappings and labels cascade in the database.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let current = self.get_by_id(id).await?;
        item::Entity::delete_by_id(current.id.clone())
            .exec(self.db)
            .await?;
        tracing::info!(item_id = %current.id, "Deleted item");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<item::Model> {
        item::Entity::find_by_id(id.to_string())
            .filter(item::Column::UserId.eq(self.user_id))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// Case-insensitive substring match over label, notes and manufacturer, narrowed by
    /// exact category and container filters. `%` and `_` in the query match literally.
    pub async fn search(&self, query: &str, filters: &ItemFilters) -> Result<Vec<item::Model>> {
        let mut condition = Condition::all().add(item::Column::UserId.eq(self.user_id));

        let query = query.trim();
        if !query.is_empty() {
            condition = condition.add(
                Condition::any()
                    .add(item::Column::ItemLabel.like(contains_pattern(query)))
                    .add(item::Column::ItemNotes.like(contains_pattern(query)))
                    .add(item::Column::ItemManufacturer.like(contains_pattern(query))),
            );
        }
        if let Some(v) = non_empty(&filters.category_functional) {
            condition = condition.add(item::Column::CategoryFunctional.eq(v));
        }
        if let Some(v) = non_empty(&filters.category_specific) {
            condition = condition.add(item::Column::CategorySpecific.eq(v));
        }
        if let Some(v) = non_empty(&filters.item_type) {
            condition = condition.add(item::Column::ItemType.eq(v));
        }
        if let Some(v) = non_empty(&filters.container) {
            condition = condition.add(item::Column::Container.eq(v));
        }

        let items = item::Entity::find()
            .filter(condition)
            .order_by_desc(item::Column::CreatedAt)
            .limit(SEARCH_LIMIT)
            .all(self.db)
            .await?;

        Ok(items)
    }

    pub async fn list_by_container(&self, container_id: &str) -> Result<Vec<item::Model>> {
        let items = item::Entity::find()
            .filter(item::Column::UserId.eq(self.user_id))
            .filter(item::Column::Container.eq(container_id))
            .order_by_desc(item::Column::CreatedAt)
            .limit(SEARCH_LIMIT)
            .all(self.db)
            .await?;

        Ok(items)
    }

    pub async fn find_by_primary_image(&self, image_id: &str) -> Result<Option<item::Model>> {
        let found = item::Entity::find()
            .filter(item::Column::UserId.eq(self.user_id))
            .filter(item::Column::PrimaryImage.eq(image_id))
            .one(self.db)
            .await?;

        Ok(found)
    }

    /// Label match within one container; how re-analysis recognises items it already created.
    pub async fn find_in_container(&self, container_id: &str, item_label: &str) -> Result<Option<item::Model>> {
        let found = item::Entity::find()
            .filter(item::Column::UserId.eq(self.user_id))
            .filter(item::Column::Container.eq(container_id))
            .filter(item::Column::ItemLabel.eq(item_label))
            .order_by_asc(item::Column::CreatedAt)
            .one(self.db)
            .await?;

        Ok(found)
    }

    /// Sorted distinct non-empty category values across the owner's items.
    pub async fn distinct_categories(&self) -> Result<CategoryLibrary> {
        Ok(CategoryLibrary {
            functional: self.distinct(item::Column::CategoryFunctional).await?,
            specific: self.distinct(item::Column::CategorySpecific).await?,
            item_type: self.distinct(item::Column::ItemType).await?,
        })
    }

    async fn distinct(&self, column: item::Column) -> Result<Vec<String>> {
        let mut values: Vec<String> = item::Entity::find()
            .select_only()
            .column(column)
            .distinct()
            .filter(item::Column::UserId.eq(self.user_id))
            .filter(column.ne(""))
            .into_tuple()
            .all(self.db)
            .await?;

        values.sort();
        Ok(values)
    }

    pub async fn history(&self, id: &str) -> Result<Vec<item_record::Model>> {
        let current = self.get_by_id(id).await?;

        let records = item_record::Entity::find()
            .filter(item_record::Column::ItemId.eq(current.id))
            .order_by_asc(item_record::Column::CreatedAt)
            .all(self.db)
            .await?;

        Ok(records)
    }

    async fn check_references(&self, container_id: Option<&str>, image_id: Option<&str>) -> Result<()> {
        if let Some(container_id) = container_id {
            let owned = container::Entity::find_by_id(container_id.to_string())
                .filter(container::Column::UserId.eq(self.user_id))
                .one(self.db)
                .await?;
            if owned.is_none() {
                return Err(AppError::BadRequest(format!("Container {} not found", container_id)));
            }
        }

        if let Some(image_id) = image_id {
            let owned = image::Entity::find_by_id(image_id.to_string())
                .filter(image::Column::UserId.eq(self.user_id))
                .one(self.db)
                .await?;
            if owned.is_none() {
                return Err(AppError::BadRequest(format!("Image {} not found", image_id)));
            }
        }

        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
