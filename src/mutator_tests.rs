// ABOUTME: Tests that rejected input never reaches storage, using SeaORM's mock connection
// ABOUTME: The mock's transaction log must stay empty whenever validation or preconditions fail

#[cfg(test)]
mod tests {
    use crate::blobs::BlobStore;
    use crate::entities::user;
    use crate::error::AppError;
    use crate::mutators::{ContainerMutator, ImageMutator, ItemMutator, LabelMutator, UserMutator};
    use crate::schema::ImageUpload;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use tempfile::TempDir;

    fn upload() -> ImageUpload {
        ImageUpload {
            file_name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: b"fake png bytes".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_mismatched_passwords_never_touch_storage() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = UserMutator::new(&db)
            .create(&json!({
                "email": "sam@example.com",
                "password": "password-one",
                "password_confirm": "password-two",
            }))
            .await;

        match result {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.violations()[0].path, "password_confirm");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_registration_never_touches_storage() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = UserMutator::new(&db)
            .create(&json!({
                "email": "invalid-email",
                "password": "x",
                "password_confirm": "x",
            }))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_user_never_touches_storage() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let temp_dir = TempDir::new().unwrap();
        let blobs = BlobStore::new(temp_dir.path().join("files"));

        for user_id in ["", "   "] {
            let result = ImageMutator::new(&db, &blobs, user_id)
                .upload_image(upload(), None)
                .await;
            assert!(matches!(result, Err(AppError::Precondition(_))));
        }

        assert!(!temp_dir.path().join("files").exists());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_records_never_touch_storage() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let item = ItemMutator::new(&db, "user123456789ab")
            .create(&json!({ "item_label": "", "item_attributes": "nope" }))
            .await;
        assert!(matches!(item, Err(AppError::Validation(_))));

        let container = ContainerMutator::new(&db, "user123456789ab")
            .create(&json!({ "container_notes": "no label" }))
            .await;
        assert!(matches!(container, Err(AppError::Validation(_))));

        let unowned = ItemMutator::new(&db, "")
            .create(&json!({
                "item_label": "Drill",
                "category_functional": "Tools",
                "category_specific": "Power Tools",
                "item_type": "Drill",
            }))
            .await;
        assert!(matches!(unowned, Err(AppError::Precondition(_))));

        let label = LabelMutator::new(&db)
            .create(&json!({ "item_id": "a", "container_id": "b", "format": "qr-only" }))
            .await;
        assert!(matches!(label, Err(AppError::Validation(_))));

        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_login_runs_a_single_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = UserMutator::new(&db)
            .authenticate(&json!({ "email": "nobody@example.com", "password": "whatever" }))
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert_eq!(db.into_transaction_log().len(), 1);
    }
}
