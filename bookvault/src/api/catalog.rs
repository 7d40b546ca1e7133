//! Catalog search endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bookvault_common::{CatalogResult, NewBook, ReadingStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Defaults to the configured cap
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct IsbnLookupRequest {
    pub isbn: String,
}

/// Single catalog match, saved to the library
#[derive(Debug, Serialize)]
pub struct BookAddedResponse {
    pub id: i64,
    pub book: CatalogResult,
}

/// Save a lone catalog hit as TBR
async fn add_single_result(state: &AppState, book: CatalogResult) -> ApiResult<BookAddedResponse> {
    let id = state
        .store
        .upsert(NewBook::from_catalog(book.clone(), ReadingStatus::Tbr))
        .await?;
    Ok(BookAddedResponse { id, book })
}

/// POST /api/search
///
/// A single match is added to the library as TBR (201). Otherwise the
/// results, possibly none, are returned for the caller to choose from (200).
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<Response> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let max_results = req.max_results.unwrap_or_else(|| state.catalog.max_results());
    let mut results = state.catalog.search_by_text(query, max_results).await;

    if results.len() == 1 {
        let added = add_single_result(&state, results.remove(0)).await?;
        info!(query = %query, id = added.id, "Added single search result");
        return Ok((StatusCode::CREATED, Json(added)).into_response());
    }

    Ok(Json(results).into_response())
}

/// POST /api/isbn_lookup
///
/// One match is added as TBR (200). Several are returned for the caller to
/// choose from (201). None gives 404.
pub async fn isbn_lookup(
    State(state): State<AppState>,
    Json(req): Json<IsbnLookupRequest>,
) -> ApiResult<Response> {
    let isbn = req.isbn.trim();
    if isbn.is_empty() {
        return Err(ApiError::BadRequest("isbn must not be empty".to_string()));
    }

    let mut results = state.catalog.search_by_isbn(isbn).await;

    match results.len() {
        0 => Err(ApiError::NotFound(format!("No book found for ISBN {}", isbn))),
        1 => {
            let added = add_single_result(&state, results.remove(0)).await?;
            info!(isbn = %isbn, id = added.id, "Added book from ISBN lookup");
            Ok((StatusCode::OK, Json(added)).into_response())
        }
        _ => Ok((StatusCode::CREATED, Json(results)).into_response()),
    }
}

/// Build catalog routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/isbn_lookup", post(isbn_lookup))
}
