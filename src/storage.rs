// ABOUTME: Storage handle bundling the SQLite connection and the image blob store
// ABOUTME: Connecting applies pending migrations before the handle is returned

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::blobs::BlobStore;
use crate::config::Config;
use crate::migration;

pub struct Storage {
    pub db: DatabaseConnection,
    pub blobs: BlobStore,
}

impl Storage {
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut options = ConnectOptions::new(config.database_url.clone());
        options.sqlx_logging(false);

        let db = Database::connect(options).await?;

        let applied = migration::run_pending(&db).await?;
        tracing::info!(applied, "Database schema is up to date");

        tokio::fs::create_dir_all(&config.storage_path).await?;

        Ok(Self {
            db,
            blobs: BlobStore::new(config.storage_path.clone()),
        })
    }
}
