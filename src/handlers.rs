// ABOUTME: HTTP handlers for analysis, labels, configuration and inventory CRUD
// ABOUTME: Each handler authenticates, validates, delegates to a mutator or service, and returns JSON

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::auth::AuthUser;
use crate::entities::{container, container_record, image, item, item_record};
use crate::error::{AppError, Result};
use crate::extract::Payload;
use crate::inventory::InventoryService;
use crate::labels;
use crate::metadata::{AnalysisResult, CategoryLibrary};
use crate::multipart::MultipartFields;
use crate::mutators::{ContainerMutator, ImageMutator, ItemMutator};
use crate::schema::{AnalyzeImageRequest, GenerateLabelRequest, ImageUpdate};
use crate::types::{
    AnalyzeResponse, ConfigResponse, HealthResponse, ImageListQuery, ItemSearchQuery,
    LabelResponse, SearchQuery, SuccessResponse,
};
use crate::validation::validate;
use crate::AppState;

fn inventory<'a>(
    state: &'a AppState,
    auth: &'a AuthUser,
) -> InventoryService<'a, sea_orm::DatabaseConnection> {
    InventoryService::new(
        &state.storage.db,
        &state.storage.blobs,
        state.analyzer.as_deref(),
        auth.id(),
    )
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Reports whether image analysis is available. Answers both GET and POST.
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        is_ai_enabled: state.config.ai_enabled(),
    })
}

pub async fn analyze_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Payload(body): Payload,
) -> Result<Json<AnalyzeResponse>> {
    let request: AnalyzeImageRequest = validate(&body)
        .map_err(|_| AppError::BadRequest("No imageId provided".to_string()))?;

    tracing::info!(image_id = %request.image_id, user_id = %auth.id(), "Analyzing image");
    let processed = inventory(&state, &auth)
        .process_existing_image(&request.image_id)
        .await?;

    Ok(Json(processed.into()))
}

pub async fn process_image(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AnalyzeResponse>)> {
    let mut fields = MultipartFields::parse(&mut multipart, state.config.max_upload_bytes()).await?;

    let processed = inventory(&state, &auth)
        .process_image_upload(fields.take_file())
        .await?;

    Ok((StatusCode::CREATED, Json(processed.into())))
}

pub async fn generate_label(
    State(state): State<AppState>,
    auth: AuthUser,
    Payload(body): Payload,
) -> Result<Json<LabelResponse>> {
    let request: GenerateLabelRequest = validate(&body)?;

    let generated = labels::generate_label(
        &state.storage.db,
        auth.id(),
        &state.config.app_url,
        &request,
    )
    .await?;

    Ok(Json(LabelResponse {
        svg: generated.svg,
        label_id: generated.label_id,
    }))
}

pub async fn get_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CategoryLibrary>> {
    let library = ItemMutator::new(&state.storage.db, auth.id())
        .distinct_categories()
        .await?;
    Ok(Json(library))
}

// Images

pub async fn list_images(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ImageListQuery>,
) -> Result<Json<Vec<image::Model>>> {
    let images = ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id());

    let listed = match query.status {
        Some(status) => {
            let filter: ImageUpdate = validate(&json!({ "analysis_status": status }))?;
            match filter.analysis_status {
                Some(status) => images.list_by_analysis_status(status).await?,
                None => images.list().await?,
            }
        }
        None => images.list().await?,
    };

    Ok(Json(listed))
}

pub async fn upload_image(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<image::Model>)> {
    let mut fields = MultipartFields::parse(&mut multipart, state.config.max_upload_bytes()).await?;

    let image_type = match fields.get_text("image_type") {
        Some(value) => validate::<ImageUpdate>(&json!({ "image_type": value }))?.image_type,
        None => None,
    };

    let image = ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id())
        .upload_image(fields.take_file(), image_type)
        .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

pub async fn get_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<image::Model>> {
    let image = ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id())
        .get_by_id(&id)
        .await?;
    Ok(Json(image))
}

pub async fn update_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Payload(body): Payload,
) -> Result<Json<image::Model>> {
    let image = ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id())
        .update(&id, &body)
        .await?;
    Ok(Json(image))
}

pub async fn delete_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id())
        .delete(&id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn image_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let images = ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id());
    let image = images.get_by_id(&id).await?;
    let bytes = images.read_file(&image).await?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        bytes,
    )
        .into_response())
}

pub async fn reanalyze_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResult>> {
    let result = inventory(&state, &auth).reanalyze_image(&id).await?;
    Ok(Json(result))
}

// Items

pub async fn search_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ItemSearchQuery>,
) -> Result<Json<Vec<item::Model>>> {
    let items = ItemMutator::new(&state.storage.db, auth.id())
        .search(&query.q, &query.filters)
        .await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Payload(body): Payload,
) -> Result<(StatusCode, Json<item::Model>)> {
    let item = ItemMutator::new(&state.storage.db, auth.id())
        .create(&body)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<item::Model>> {
    let item = ItemMutator::new(&state.storage.db, auth.id())
        .get_by_id(&id)
        .await?;
    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Payload(body): Payload,
) -> Result<Json<item::Model>> {
    let item = ItemMutator::new(&state.storage.db, auth.id())
        .update(&id, &body)
        .await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    ItemMutator::new(&state.storage.db, auth.id())
        .delete(&id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn item_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<item_record::Model>>> {
    let records = ItemMutator::new(&state.storage.db, auth.id())
        .history(&id)
        .await?;
    Ok(Json(records))
}

pub async fn item_images(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<image::Model>>> {
    let images = ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id())
        .list_for_item(&id)
        .await?;
    Ok(Json(images))
}

// Containers

pub async fn search_containers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<container::Model>>> {
    let containers = ContainerMutator::new(&state.storage.db, auth.id())
        .search(&query.q)
        .await?;
    Ok(Json(containers))
}

pub async fn create_container(
    State(state): State<AppState>,
    auth: AuthUser,
    Payload(body): Payload,
) -> Result<(StatusCode, Json<container::Model>)> {
    let container = ContainerMutator::new(&state.storage.db, auth.id())
        .create(&body)
        .await?;
    Ok((StatusCode::CREATED, Json(container)))
}

pub async fn get_container(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<container::Model>> {
    let container = ContainerMutator::new(&state.storage.db, auth.id())
        .get_by_id(&id)
        .await?;
    Ok(Json(container))
}

pub async fn update_container(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Payload(body): Payload,
) -> Result<Json<container::Model>> {
    let container = ContainerMutator::new(&state.storage.db, auth.id())
        .update(&id, &body)
        .await?;
    Ok(Json(container))
}

pub async fn delete_container(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    ContainerMutator::new(&state.storage.db, auth.id())
        .delete(&id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn container_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<container_record::Model>>> {
    let records = ContainerMutator::new(&state.storage.db, auth.id())
        .history(&id)
        .await?;
    Ok(Json(records))
}

pub async fn container_images(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<image::Model>>> {
    let images = ImageMutator::new(&state.storage.db, &state.storage.blobs, auth.id())
        .list_for_container(&id)
        .await?;
    Ok(Json(images))
}

pub async fn container_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<item::Model>>> {
    let container = ContainerMutator::new(&state.storage.db, auth.id())
        .get_by_id(&id)
        .await?;
    let items = ItemMutator::new(&state.storage.db, auth.id())
        .list_by_container(&container.id)
        .await?;
    Ok(Json(items))
}
