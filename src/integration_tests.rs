// ABOUTME: Integration tests for API endpoints
// ABOUTME: Drives the full router over HTTP: auth, configuration, the image pipeline, labels and CRUD

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::analysis::testing::StubAnalyzer;
    use crate::blobs::BlobStore;
    use crate::metadata::{
        AnalysisResult, ContainerImageMetadata, ContainerMetadata, ItemImageMetadata, ItemMetadata,
    };
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use sea_orm::Database;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    struct TestApp {
        server: TestServer,
        _temp_dir: TempDir,
    }

    async fn create_test_app(config: Config, analyzer: Option<Arc<dyn ImageAnalyzer>>) -> TestApp {
        let temp_dir = TempDir::new().unwrap();
        let db_url = format!("sqlite:{}?mode=rwc", temp_dir.path().join("app.db").display());
        let db = Database::connect(&db_url).await.unwrap();
        migration::run_pending(&db).await.unwrap();

        let state = AppState {
            config: Arc::new(config),
            storage: Arc::new(Storage {
                db,
                blobs: BlobStore::new(temp_dir.path().join("files")),
            }),
            analyzer,
        };

        TestApp {
            server: TestServer::new(build_router(state)).unwrap(),
            _temp_dir: temp_dir,
        }
    }

    async fn create_plain_app() -> TestApp {
        create_test_app(Config::default(), None).await
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }

    async fn register(server: &TestServer, email: &str) -> String {
        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "name": "Test User",
                "email": email,
                "password": "correct horse",
                "password_confirm": "correct horse",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        body["token"].as_str().unwrap().to_string()
    }

    fn photo(bytes: &[u8]) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(bytes.to_vec())
                .file_name("photo.png")
                .mime_type("image/png"),
        )
    }

    fn item_result() -> AnalysisResult {
        AnalysisResult::Item(ItemImageMetadata {
            image_label: "Drill on bench".to_string(),
            image_notes: String::new(),
            item: ItemMetadata {
                item_label: "Cordless drill".to_string(),
                category_functional: "Tools".to_string(),
                category_specific: "Power Tools".to_string(),
                item_type: "Drill".to_string(),
                ..Default::default()
            },
        })
    }

    fn container_result() -> AnalysisResult {
        let item = |label: &str| ItemMetadata {
            item_label: label.to_string(),
            category_functional: "Hardware".to_string(),
            category_specific: "Fasteners".to_string(),
            item_type: "Screw".to_string(),
            ..Default::default()
        };

        AnalysisResult::Container(ContainerImageMetadata {
            image_label: "Parts bin".to_string(),
            image_notes: String::new(),
            container: ContainerMetadata {
                container_label: "Bin A".to_string(),
                container_notes: String::new(),
                container_items: vec![item("M3 screws"), item("M4 screws")],
            },
        })
    }

    #[tokio::test]
    async fn test_health_and_security_headers() {
        let app = create_plain_app().await;

        let response = app.server.get("/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
        assert_eq!(response.header(header::X_FRAME_OPTIONS), "DENY");
        assert_eq!(response.header(header::X_CONTENT_TYPE_OPTIONS), "nosniff");
        assert_eq!(response.header(header::CACHE_CONTROL), "no-store");
    }

    #[tokio::test]
    async fn test_config_reports_ai_availability() {
        let app = create_plain_app().await;
        app.server
            .get("/api/config")
            .await
            .assert_json(&json!({ "isAIEnabled": false }));

        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        let app = create_test_app(config, None).await;
        app.server
            .get("/api/config")
            .await
            .assert_json(&json!({ "isAIEnabled": true }));
        app.server
            .post("/api/config")
            .await
            .assert_json(&json!({ "isAIEnabled": true }));
    }

    #[tokio::test]
    async fn test_protected_routes_require_auth() {
        let app = create_plain_app().await;

        for path in ["/api/auth/me", "/api/items", "/api/containers", "/api/images", "/api/categories"] {
            let response = app.server.get(path).expect_failure().await;
            response.assert_status(StatusCode::UNAUTHORIZED);
        }

        let response = app
            .server
            .post("/api/analyze-image")
            .json(&json!({ "imageId": "abc" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = app
            .server
            .get("/api/auth/me")
            .add_header(header::AUTHORIZATION, bearer("not-a-real-token"))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = create_plain_app().await;

        let response = app
            .server
            .post("/api/auth/register")
            .json(&json!({
                "name": "Sam",
                "email": "Sam@Example.com",
                "password": "correct horse",
                "password_confirm": "correct horse",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["user"]["email"], "sam@example.com");
        assert!(body["user"].get("password_hash").is_none());
        assert!(!response.cookie("stockroom_session").value().is_empty());

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": "sam@example.com", "password": "correct horse" }))
            .await;
        response.assert_status_ok();
        let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

        let me: Value = app
            .server
            .get("/api/auth/me")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        assert_eq!(me["name"], "Sam");

        // The cookie alone is enough
        let cookie = HeaderValue::from_str(&format!("stockroom_session={}", token)).unwrap();
        app.server
            .get("/api/auth/me")
            .add_header(header::COOKIE, cookie)
            .await
            .assert_status_ok();

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": "sam@example.com", "password": "wrong horse" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let app = create_plain_app().await;

        let response = app
            .server
            .post("/api/auth/register")
            .json(&json!({
                "email": "sam@example.com",
                "password": "password-one",
                "password_confirm": "password-two",
            }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["violations"][0]["path"], "password_confirm");

        register(&app.server, "sam@example.com").await;
        let response = app
            .server
            .post("/api/auth/register")
            .json(&json!({
                "email": "sam@example.com",
                "password": "correct horse",
                "password_confirm": "correct horse",
            }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let app = create_plain_app().await;
        let token = register(&app.server, "sam@example.com").await;

        app.server
            .post("/api/auth/logout")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .assert_json(&json!({ "success": true }));

        let response = app
            .server
            .get("/api/auth/me")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Logging out without a session still succeeds
        app.server.post("/api/auth/logout").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_analyze_image_requires_image_id() {
        let app = create_plain_app().await;
        let token = register(&app.server, "sam@example.com").await;

        let response = app
            .server
            .post("/api/analyze-image")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({}))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "No imageId provided");

        let response = app
            .server
            .post("/api/analyze-image")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "imageId": "missing00000000" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analyze_uploaded_image_refreshes_in_place() {
        let stub = Arc::new(StubAnalyzer::returning(item_result()));
        let app = create_test_app(Config::default(), Some(stub.clone() as Arc<dyn ImageAnalyzer>)).await;
        let token = register(&app.server, "sam@example.com").await;

        let response = app
            .server
            .post("/api/images")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .multipart(photo(b"drill photo"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let image_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        let first: Value = app
            .server
            .post("/api/analyze-image")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "imageId": image_id }))
            .await
            .json();
        assert_eq!(first["success"], true);
        assert_eq!(first["image"]["analysis_status"], "completed");
        assert_eq!(first["image"]["image_type"], "item");
        assert_eq!(first["result"]["type"], "item");
        assert_eq!(first["items"][0]["item_label"], "Cordless drill");
        assert_eq!(first["items"][0]["primary_image"], image_id.as_str());

        let second: Value = app
            .server
            .post("/api/analyze-image")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "imageId": image_id }))
            .await
            .json();
        assert_eq!(second["items"][0]["id"], first["items"][0]["id"]);
        assert_eq!(stub.calls(), 1);

        let items: Value = app
            .server
            .get("/api/items")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        assert_eq!(items.as_array().unwrap().len(), 1);

        let file = app
            .server
            .get(&format!("/api/images/{}/file", image_id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        file.assert_status_ok();
        assert_eq!(file.header(header::CONTENT_TYPE), "image/png");
        assert_eq!(file.header(header::CACHE_CONTROL), "private, max-age=3600");
        assert_eq!(file.as_bytes().as_ref(), b"drill photo");

        // Reanalysis bypasses the cache and leaves the items alone
        let fresh: Value = app
            .server
            .post(&format!("/api/images/{}/reanalyze", image_id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        assert_eq!(fresh["type"], "item");
        assert_eq!(fresh["data"]["item"]["item_label"], "Cordless drill");
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_process_image_builds_container() {
        let stub = Arc::new(StubAnalyzer::returning(container_result()));
        let app = create_test_app(Config::default(), Some(stub.clone() as Arc<dyn ImageAnalyzer>)).await;
        let token = register(&app.server, "sam@example.com").await;

        let response = app
            .server
            .post("/api/process-image")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .multipart(photo(b"bin photo"))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["image"]["image_type"], "container");
        assert_eq!(body["container"]["container_label"], "Bin A");
        let container_id = body["container"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["items"].as_array().unwrap().len(), 2);

        let contents: Value = app
            .server
            .get(&format!("/api/containers/{}/items", container_id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        assert_eq!(contents.as_array().unwrap().len(), 2);

        let categories: Value = app
            .server
            .get("/api/categories")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        assert_eq!(categories["functional"], json!(["Hardware"]));
    }

    #[tokio::test]
    async fn test_process_image_without_analyzer_marks_failure() {
        let app = create_plain_app().await;
        let token = register(&app.server, "sam@example.com").await;

        let response = app
            .server
            .post("/api/process-image")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .multipart(photo(b"unanalyzed"))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let failed: Value = app
            .server
            .get("/api/images?status=failed")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        assert_eq!(failed.as_array().unwrap().len(), 1);

        let response = app
            .server
            .post("/api/process-image")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .multipart(MultipartForm::new().add_text("note", "no file"))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_label() {
        let app = create_plain_app().await;
        let token = register(&app.server, "sam@example.com").await;

        let container: Value = app
            .server
            .post("/api/containers")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "container_label": "Garage shelf" }))
            .await
            .json();
        let container_id = container["id"].as_str().unwrap();

        let response = app
            .server
            .post("/api/labels/generate")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({
                "targetId": container_id,
                "targetType": "container",
                "format": "shipping-4x6",
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let svg = body["svg"].as_str().unwrap();
        assert!(svg.contains("Garage shelf"));
        assert!(svg.contains(body["labelId"].as_str().unwrap()));

        let response = app
            .server
            .post("/api/labels/generate")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "targetId": container_id, "targetType": "shelf", "format": "shipping-4x6" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = app
            .server
            .post("/api/labels/generate")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "targetId": "missing00000000", "targetType": "item", "format": "qr-only" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_item_crud_and_history() {
        let app = create_plain_app().await;
        let token = register(&app.server, "sam@example.com").await;

        let response = app
            .server
            .post("/api/items")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({
                "item_label": "Drill",
                "category_functional": "Tools",
                "category_specific": "Power Tools",
                "item_type": "Drill",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let item_id = response.json::<Value>()["id"].as_str().unwrap().to_string();
        let item_path = format!("/api/items/{}", item_id);

        let updated: Value = app
            .server
            .patch(&item_path)
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "item_label": "Cordless drill" }))
            .await
            .json();
        assert_eq!(updated["item_label"], "Cordless drill");

        let found: Value = app
            .server
            .get("/api/items?q=cordless")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        assert_eq!(found.as_array().unwrap().len(), 1);

        let history: Value = app
            .server
            .get(&format!("{}/history", item_path))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .json();
        let history = history.as_array().unwrap();
        assert!(history.iter().any(|r| r["transaction_type"] == "create"));
        assert!(history.iter().any(|r| {
            r["field_name"] == "item_label" && r["previous_value"] == "Drill"
        }));

        let response = app
            .server
            .post("/api/items")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "item_label": "" }))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        app.server
            .delete(&item_path)
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await
            .assert_json(&json!({ "success": true }));

        let response = app
            .server
            .get(&item_path)
            .add_header(header::AUTHORIZATION, bearer(&token))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_users_cannot_see_each_other() {
        let app = create_plain_app().await;
        let owner = register(&app.server, "owner@example.com").await;
        let other = register(&app.server, "other@example.com").await;

        let container: Value = app
            .server
            .post("/api/containers")
            .add_header(header::AUTHORIZATION, bearer(&owner))
            .json(&json!({ "container_label": "Private bin" }))
            .await
            .json();
        let path = format!("/api/containers/{}", container["id"].as_str().unwrap());

        let response = app
            .server
            .get(&path)
            .add_header(header::AUTHORIZATION, bearer(&other))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = app
            .server
            .delete(&path)
            .add_header(header::AUTHORIZATION, bearer(&other))
            .expect_failure()
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let listed: Value = app
            .server
            .get("/api/containers")
            .add_header(header::AUTHORIZATION, bearer(&other))
            .await
            .json();
        assert!(listed.as_array().unwrap().is_empty());

        app.server
            .get(&path)
            .add_header(header::AUTHORIZATION, bearer(&owner))
            .await
            .assert_status_ok();
    }
}
