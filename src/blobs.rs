// ABOUTME: Local filesystem store for uploaded image files
// ABOUTME: Blobs live at {root}/images/{image_id}/{file_name}

use std::path::PathBuf;
use tokio::fs;

use crate::error::{AppError, Result};

const NAMESPACE: &str = "images";

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, image_id: &str) -> PathBuf {
        self.root.join(NAMESPACE).join(image_id)
    }

    fn path(&self, image_id: &str, file_name: &str) -> PathBuf {
        self.dir(image_id).join(file_name)
    }

    pub async fn put(&self, image_id: &str, file_name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(image_id, file_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        tracing::debug!(image_id, file_name, size = bytes.len(), "Stored image blob");
        Ok(())
    }

    pub async fn get(&self, image_id: &str, file_name: &str) -> Result<Vec<u8>> {
        let path = self.path(image_id, file_name);
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("File for image {} not found", image_id))
            } else {
                AppError::Blob(e)
            }
        })
    }

    /// Removes every blob stored for the image. Missing directories are not an error.
    pub async fn delete(&self, image_id: &str) -> Result<()> {
        match fs::remove_dir_all(self.dir(image_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Blob(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path());

        store.put("img1", "photo.png", b"pixels").await.unwrap();
        assert_eq!(store.get("img1", "photo.png").await.unwrap(), b"pixels");

        store.delete("img1").await.unwrap();
        assert!(matches!(
            store.get("img1", "photo.png").await,
            Err(AppError::NotFound(_))
        ));

        // Deleting twice is fine
        store.delete("img1").await.unwrap();
    }
}
