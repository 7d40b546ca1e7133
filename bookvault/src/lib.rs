//! BookVault library interface
//!
//! Exposes the services and the HTTP router for the binary and for
//! integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::cover_cache::COVER_ROUTE;
use crate::services::{BookStore, CatalogClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: BookStore,
    pub catalog: Arc<CatalogClient>,
    /// Directory served under [`COVER_ROUTE`]
    pub cover_cache_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: BookStore, catalog: Arc<CatalogClient>, cover_cache_dir: PathBuf) -> Self {
        Self {
            store,
            catalog,
            cover_cache_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let covers = ServeDir::new(&state.cover_cache_dir);

    Router::new()
        .merge(api::health_routes())
        .merge(api::book_routes())
        .merge(api::catalog_routes())
        .merge(api::tag_routes())
        .merge(api::stats_routes())
        .with_state(state)
        .nest_service(&format!("/{}", COVER_ROUTE), covers)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
