// ABOUTME: Change history and image-mapping rows written alongside item and container changes
// ABOUTME: Callers pass the open transaction so history commits or rolls back with the change

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::Serialize;
use serde_json::Value;

use crate::entities::{container_image, container_record, item_image, item_record};
use crate::entities::item_record::TransactionType;
use crate::error::Result;
use crate::metadata::BoundingBox;
use crate::utils::new_record_id;

/// Columns that change on every write or never change; they are not tracked.
const UNTRACKED: &[&str] = &["id", "user_id", "created_at", "updated_at"];

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub previous: String,
    pub new: String,
}

fn flatten(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Field-by-field comparison of two versions of a record.
pub fn diff<T: Serialize>(before: &T, after: &T) -> Result<Vec<FieldChange>> {
    let before = serde_json::to_value(before)?;
    let after = serde_json::to_value(after)?;

    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return Ok(Vec::new());
    };

    let changes = after
        .iter()
        .filter(|(field, _)| !UNTRACKED.contains(&field.as_str()))
        .filter_map(|(field, new)| {
            let previous = before.get(field).map(flatten).unwrap_or_default();
            let new = flatten(new);
            (previous != new).then(|| FieldChange {
                field: field.clone(),
                previous,
                new,
            })
        })
        .collect();

    Ok(changes)
}

pub async fn item_created<C, T>(db: &C, item_id: &str, user_id: &str, snapshot: &T) -> Result<()>
where
    C: ConnectionTrait,
    T: Serialize,
{
    item_record::ActiveModel {
        id: Set(new_record_id()),
        item_id: Set(item_id.to_string()),
        user_id: Set(Some(user_id.to_string())),
        transaction_type: Set(TransactionType::Create),
        field_name: Set(None),
        new_value: Set(serde_json::to_string(snapshot)?),
        previous_value: Set(None),
        created_at: Set(chrono::Utc::now().timestamp()),
    }
    .insert(db)
    .await?;

    Ok(())
}

pub async fn item_updated<C>(db: &C, item_id: &str, user_id: &str, changes: &[FieldChange]) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().timestamp();
    for change in changes {
        item_record::ActiveModel {
            id: Set(new_record_id()),
            item_id: Set(item_id.to_string()),
            user_id: Set(Some(user_id.to_string())),
            transaction_type: Set(TransactionType::Update),
            field_name: Set(Some(change.field.clone())),
            new_value: Set(change.new.clone()),
            previous_value: Set(Some(change.previous.clone())),
            created_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

pub async fn container_created<C, T>(db: &C, container_id: &str, user_id: &str, snapshot: &T) -> Result<()>
where
    C: ConnectionTrait,
    T: Serialize,
{
    container_record::ActiveModel {
        id: Set(new_record_id()),
        container_id: Set(container_id.to_string()),
        user_id: Set(Some(user_id.to_string())),
        transaction_type: Set(TransactionType::Create),
        field_name: Set(None),
        new_value: Set(serde_json::to_string(snapshot)?),
        previous_value: Set(None),
        created_at: Set(chrono::Utc::now().timestamp()),
    }
    .insert(db)
    .await?;

    Ok(())
}

pub async fn container_updated<C>(
    db: &C,
    container_id: &str,
    user_id: &str,
    changes: &[FieldChange],
) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().timestamp();
    for change in changes {
        container_record::ActiveModel {
            id: Set(new_record_id()),
            container_id: Set(container_id.to_string()),
            user_id: Set(Some(user_id.to_string())),
            transaction_type: Set(TransactionType::Update),
            field_name: Set(Some(change.field.clone())),
            new_value: Set(change.new.clone()),
            previous_value: Set(Some(change.previous.clone())),
            created_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

pub async fn map_item_image<C: ConnectionTrait>(
    db: &C,
    item_id: &str,
    image_id: &str,
    bounding_box: Option<BoundingBox>,
) -> Result<()> {
    item_image::ActiveModel {
        id: Set(new_record_id()),
        item_id: Set(item_id.to_string()),
        image_id: Set(image_id.to_string()),
        bounding_box: Set(bounding_box),
        created_at: Set(chrono::Utc::now().timestamp()),
    }
    .insert(db)
    .await?;

    Ok(())
}

pub async fn map_container_image<C: ConnectionTrait>(
    db: &C,
    container_id: &str,
    image_id: &str,
    bounding_box: Option<BoundingBox>,
) -> Result<()> {
    container_image::ActiveModel {
        id: Set(new_record_id()),
        container_id: Set(container_id.to_string()),
        image_id: Set(image_id.to_string()),
        bounding_box: Set(bounding_box),
        created_at: Set(chrono::Utc::now().timestamp()),
    }
    .insert(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_reports_changed_fields_only() {
        let before = json!({
            "id": "a",
            "item_label": "Drill",
            "item_notes": "",
            "container": null,
            "item_attributes": [],
            "updated_at": 1,
        });
        let after = json!({
            "id": "a",
            "item_label": "Cordless drill",
            "item_notes": "",
            "container": "box1",
            "item_attributes": [],
            "updated_at": 2,
        });

        let changes = diff(&before, &after).unwrap();
        assert_eq!(changes.len(), 2);

        let label = changes.iter().find(|c| c.field == "item_label").unwrap();
        assert_eq!(label.previous, "Drill");
        assert_eq!(label.new, "Cordless drill");

        let container = changes.iter().find(|c| c.field == "container").unwrap();
        assert_eq!(container.previous, "");
        assert_eq!(container.new, "box1");
    }

    #[test]
    fn test_diff_serializes_structured_values() {
        let before = json!({ "primary_image_bbox": null });
        let after = json!({ "primary_image_bbox": { "x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0 } });

        let changes = diff(&before, &after).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].new.contains("\"width\":3.0"));
    }
}
