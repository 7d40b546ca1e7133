//! Tag endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use bookvault_common::Tag;
use serde::{Deserialize, Serialize};

use crate::api::books::SuccessResponse;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTagResponse {
    pub id: i64,
}

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.store.list_tags().await?))
}

/// POST /api/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<CreateTagResponse>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("tag name must not be empty".to_string()));
    }

    match state.store.create_tag(name, req.color.as_deref()).await {
        Some(id) => Ok((StatusCode::CREATED, Json(CreateTagResponse { id }))),
        None => Err(ApiError::Conflict(format!("Tag '{}' already exists", name))),
    }
}

/// PUT /api/tags/:id
pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
    Json(req): Json<UpdateTagRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.update_tag(tag_id, req.name.trim(), &req.color).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/tags/:id
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.delete_tag(tag_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/books/:id/tags/:tag_id
pub async fn attach_tag(
    State(state): State<AppState>,
    Path((book_id, tag_id)): Path<(i64, i64)>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.attach_tag(book_id, tag_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/books/:id/tags/:tag_id
pub async fn detach_tag(
    State(state): State<AppState>,
    Path((book_id, tag_id)): Path<(i64, i64)>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.detach_tag(book_id, tag_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Build tag routes
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tags", get(list_tags).post(create_tag))
        .route("/api/tags/:id", put(update_tag).delete(delete_tag))
        .route("/api/books/:id/tags/:tag_id", post(attach_tag).delete(detach_tag))
}
