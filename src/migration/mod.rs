// ABOUTME: SeaORM migration module for database schema management
// ABOUTME: Orders the schema steps and applies each pending step in its own transaction

use sea_orm::{DatabaseConnection, TransactionTrait};
use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_users::Migration),
            Box::new(m20260101_000002_create_images::Migration),
            Box::new(m20260101_000003_create_containers::Migration),
            Box::new(m20260101_000004_create_items::Migration),
            Box::new(m20260101_000005_create_image_mappings::Migration),
            Box::new(m20260101_000006_create_image_metadata::Migration),
            Box::new(m20260101_000007_create_history_records::Migration),
            Box::new(m20260101_000008_create_labels::Migration),
            Box::new(m20260115_000001_add_previous_value_to_records::Migration),
            Box::new(m20260120_000001_add_item_search_index::Migration),
        ]
    }
}

/// Applies pending migrations one at a time, committing after each.
///
/// A failing step rolls back on its own, so the recorded version stays at the
/// last step that completed. Returns the number of steps applied.
pub async fn run_pending(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let pending = Migrator::get_pending_migrations(db).await?;

    for migration in &pending {
        let txn = db.begin().await?;
        Migrator::up(&txn, Some(1)).await?;
        txn.commit().await?;
        tracing::info!(migration = migration.name(), "Applied migration");
    }

    Ok(pending.len())
}

pub mod m20260101_000001_create_users;
pub mod m20260101_000002_create_images;
pub mod m20260101_000003_create_containers;
pub mod m20260101_000004_create_items;
pub mod m20260101_000005_create_image_mappings;
pub mod m20260101_000006_create_image_metadata;
pub mod m20260101_000007_create_history_records;
pub mod m20260101_000008_create_labels;
pub mod m20260115_000001_add_previous_value_to_records;
pub mod m20260120_000001_add_item_search_index;
