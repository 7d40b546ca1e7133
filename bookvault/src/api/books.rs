//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use bookvault_common::{BookRecord, NewBook, ReadingStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters for GET /api/books
#[derive(Debug, Deserialize)]
pub struct BooksQuery {
    /// Comma-separated tag ids; books must carry all of them
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookKey {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub title: String,
    pub author: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRatingRequest {
    pub title: String,
    pub author: String,
    pub status: String,
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct EbookRequest {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhysicalCopyRequest {
    pub physical_copy: bool,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct AddBookResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct EbookResponse {
    pub book_id: i64,
    pub ebookpath: Option<String>,
}

/// Parse "1,2,3" into tag ids, ignoring blank segments
fn parse_tag_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid tag id: {}", s)))
        })
        .collect()
}

/// GET /api/books
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BooksQuery>,
) -> ApiResult<Json<Vec<BookRecord>>> {
    let tag_ids = match query.tags.as_deref() {
        Some(raw) => parse_tag_ids(raw)?,
        None => Vec::new(),
    };

    let books = if tag_ids.is_empty() {
        state.store.list_all().await?
    } else {
        state.store.filter_by_tags(&tag_ids).await?
    };

    debug!(count = books.len(), filtered = !tag_ids.is_empty(), "Listed books");
    Ok(Json(books))
}

/// POST /api/books
///
/// Adds a selected search result. The status is always TBR.
pub async fn add_book(
    State(state): State<AppState>,
    Json(book): Json<NewBook>,
) -> ApiResult<(StatusCode, Json<AddBookResponse>)> {
    if book.title.trim().is_empty() || book.author.trim().is_empty() {
        return Err(ApiError::BadRequest("title and author are required".to_string()));
    }

    let id = state.store.upsert(book.with_status(ReadingStatus::Tbr)).await?;
    Ok((StatusCode::CREATED, Json(AddBookResponse { id })))
}

/// GET /api/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> ApiResult<Json<BookRecord>> {
    state
        .store
        .find_by_id(book_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", book_id)))
}

/// POST /api/update_status
///
/// Unknown status values are ignored and reported as `success: false`.
pub async fn update_status(
    State(state): State<AppState>,
    Json(req): Json<UpdateStatusRequest>,
) -> Json<SuccessResponse> {
    let Ok(status) = req.status.parse::<ReadingStatus>() else {
        warn!(status = %req.status, "Ignoring unknown status");
        return Json(SuccessResponse { success: false });
    };

    let success = match state.store.update_status(&req.title, &req.author, status).await {
        Ok(()) => true,
        Err(e) => {
            warn!(title = %req.title, author = %req.author, error = %e, "Status update failed");
            false
        }
    };

    Json(SuccessResponse { success })
}

/// POST /api/update_status_rating
pub async fn update_status_rating(
    State(state): State<AppState>,
    Json(req): Json<UpdateStatusRatingRequest>,
) -> Json<SuccessResponse> {
    let Ok(status) = req.status.parse::<ReadingStatus>() else {
        warn!(status = %req.status, "Ignoring unknown status");
        return Json(SuccessResponse { success: false });
    };
    if req.rating < 0 {
        warn!(rating = req.rating, "Ignoring negative rating");
        return Json(SuccessResponse { success: false });
    }

    let success = match state
        .store
        .update_status_and_rating(&req.title, &req.author, status, req.rating)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(title = %req.title, author = %req.author, error = %e, "Status/rating update failed");
            false
        }
    };

    Json(SuccessResponse { success })
}

/// POST /api/remove_book
pub async fn remove_book(
    State(state): State<AppState>,
    Json(key): Json<BookKey>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.remove(&key.title, &key.author).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/books/:id/ebook
pub async fn get_ebook(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Json<EbookResponse> {
    let ebookpath = state.store.get_ebook_path(book_id).await;
    Json(EbookResponse { book_id, ebookpath })
}

/// PUT /api/books/:id/ebook
pub async fn set_ebook(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(req): Json<EbookRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    if state.store.set_ebook_path(book_id, req.path.as_deref()).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(ApiError::NotFound(format!("Book {} not found", book_id)))
    }
}

/// PUT /api/books/:id/physical_copy
pub async fn set_physical_copy(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(req): Json<PhysicalCopyRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    state.store.set_physical_copy(book_id, req.physical_copy).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Build book routes
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/api/books", get(list_books).post(add_book))
        .route("/api/books/:id", get(get_book))
        .route("/api/books/:id/ebook", get(get_ebook).put(set_ebook))
        .route("/api/books/:id/physical_copy", put(set_physical_copy))
        .route("/api/update_status", post(update_status))
        .route("/api/update_status_rating", post(update_status_rating))
        .route("/api/remove_book", post(remove_book))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_ids() {
        assert_eq!(parse_tag_ids("1,2, 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_tag_ids("").unwrap(), Vec::<i64>::new());
        assert_eq!(parse_tag_ids("4,,").unwrap(), vec![4]);
        assert!(parse_tag_ids("1,x").is_err());
    }
}
