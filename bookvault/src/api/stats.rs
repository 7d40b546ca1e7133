//! Library statistics endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::error::ApiResult;
use crate::services::LibraryStats;
use crate::AppState;

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<LibraryStats>> {
    Ok(Json(state.store.compute_stats().await?))
}

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/api/stats", get(get_stats))
}
