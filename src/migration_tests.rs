// ABOUTME: Schema migration tests: every step's down exactly undoes its up
// ABOUTME: Compares table columns (name, type, not-null) and index sets before and after

#[cfg(test)]
mod tests {
    use crate::migration::{run_pending, Migrator};
    use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
    use sea_orm_migration::MigratorTrait;
    use std::collections::{BTreeMap, BTreeSet};
    use tempfile::TempDir;

    #[derive(Debug, PartialEq)]
    struct SchemaSnapshot {
        columns: BTreeMap<String, Vec<(String, String, bool)>>,
        indexes: BTreeSet<String>,
    }

    async fn create_test_db() -> (DatabaseConnection, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("migrations.db");
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url).await.unwrap();
        (db, temp_dir)
    }

    async fn snapshot(db: &DatabaseConnection) -> SchemaSnapshot {
        let objects = db
            .query_all(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT type, name FROM sqlite_master WHERE name NOT LIKE 'sqlite_%'",
            ))
            .await
            .unwrap();

        let mut columns = BTreeMap::new();
        let mut indexes = BTreeSet::new();

        for object in objects {
            let kind: String = object.try_get("", "type").unwrap();
            let name: String = object.try_get("", "name").unwrap();

            match kind.as_str() {
                "table" => {
                    let info = db
                        .query_all(Statement::from_string(
                            DbBackend::Sqlite,
                            format!("PRAGMA table_info('{}')", name),
                        ))
                        .await
                        .unwrap();

                    let fields = info
                        .iter()
                        .map(|row| {
                            let column: String = row.try_get("", "name").unwrap();
                            let data_type: String = row.try_get("", "type").unwrap();
                            let not_null: i32 = row.try_get("", "notnull").unwrap();
                            (column, data_type, not_null != 0)
                        })
                        .collect();
                    columns.insert(name, fields);
                }
                "index" => {
                    indexes.insert(name);
                }
                _ => {}
            }
        }

        SchemaSnapshot { columns, indexes }
    }

    #[tokio::test]
    async fn test_each_migration_round_trips() {
        let (db, _temp_dir) = create_test_db().await;
        let total = Migrator::migrations().len();

        // Bookkeeping table first, so it is part of every baseline
        Migrator::install(&db).await.unwrap();

        for step in 0..total {
            let before = snapshot(&db).await;

            Migrator::up(&db, Some(1)).await.unwrap();
            let applied = snapshot(&db).await;
            assert_ne!(before, applied, "migration {} changed nothing", step);

            Migrator::down(&db, Some(1)).await.unwrap();
            let reverted = snapshot(&db).await;
            assert_eq!(before, reverted, "migration {} did not revert cleanly", step);

            // Leave this step applied so the next one runs on top of it
            Migrator::up(&db, Some(1)).await.unwrap();
        }

        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_pending_applies_each_step_once() {
        let (db, _temp_dir) = create_test_db().await;

        let applied = run_pending(&db).await.unwrap();
        assert_eq!(applied, Migrator::migrations().len());
        assert_eq!(run_pending(&db).await.unwrap(), 0);

        let schema = snapshot(&db).await;
        let records = &schema.columns["item_records"];
        assert!(records.iter().any(|(name, _, not_null)| name == "previous_value" && !not_null));
        assert!(schema.indexes.contains("idx_image_metadata_file_hash"));
        assert!(schema.indexes.contains("idx_items_search"));
    }

    #[tokio::test]
    async fn test_full_rollback_leaves_only_bookkeeping() {
        let (db, _temp_dir) = create_test_db().await;

        run_pending(&db).await.unwrap();
        Migrator::down(&db, None).await.unwrap();

        let schema = snapshot(&db).await;
        let tables: Vec<&str> = schema.columns.keys().map(String::as_str).collect();
        assert_eq!(tables, vec!["seaql_migrations"]);
        assert!(schema.indexes.is_empty());
    }
}
