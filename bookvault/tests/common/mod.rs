//! Shared test fixtures
//!
//! `FakeCatalog` is a local axum server standing in for both the catalog
//! search endpoint and the cover image host, counting every request.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bookvault::services::{BookStore, CatalogClient, CoverCache};
use bookvault_common::config::CatalogConfig;
use bookvault_common::db::init_in_memory;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Query that makes the fake catalog answer 500
pub const FAILING_QUERY: &str = "explode";

#[derive(Clone, Default)]
struct FakeState {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    queries: Arc<Mutex<Vec<String>>>,
    catalog_hits: Arc<AtomicUsize>,
    cover_hits: Arc<AtomicUsize>,
}

pub struct FakeCatalog {
    base: String,
    state: FakeState,
}

async fn volumes(
    State(state): State<FakeState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.catalog_hits.fetch_add(1, Ordering::SeqCst);
    let q = params.get("q").cloned().unwrap_or_default();
    state.queries.lock().unwrap().push(q.clone());

    if q == FAILING_QUERY {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    let body = state
        .responses
        .lock()
        .unwrap()
        .get(&q)
        .cloned()
        .unwrap_or_else(|| json!({ "kind": "books#volumes", "totalItems": 0 }));

    Json(body).into_response()
}

async fn cover(State(state): State<FakeState>, Path(name): Path<String>) -> Response {
    state.cover_hits.fetch_add(1, Ordering::SeqCst);
    if name.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    (StatusCode::OK, format!("image-bytes-{}", name)).into_response()
}

impl FakeCatalog {
    pub async fn start() -> Self {
        let state = FakeState::default();
        let app = Router::new()
            .route("/volumes", get(volumes))
            .route("/covers/:name", get(cover))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    /// Canned response for an exact `q` value
    pub fn respond(&self, query: &str, body: Value) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(query.to_string(), body);
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: format!("{}/volumes", self.base),
            ..CatalogConfig::default()
        }
    }

    pub fn client(&self) -> Arc<CatalogClient> {
        Arc::new(CatalogClient::new(&self.catalog_config()).unwrap())
    }

    pub fn cover_url(&self, name: &str) -> String {
        format!("{}/covers/{}", self.base, name)
    }

    pub fn catalog_hits(&self) -> usize {
        self.state.catalog_hits.load(Ordering::SeqCst)
    }

    pub fn cover_hits(&self) -> usize {
        self.state.cover_hits.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.queries.lock().unwrap().clone()
    }
}

/// Catalog item in the volumes response shape
pub fn volume(title: &str, authors: &[&str], isbn: &str) -> Value {
    json!({
        "selfLink": format!("https://catalog.test/volumes/{}", isbn),
        "volumeInfo": {
            "title": title,
            "authors": authors,
            "imageLinks": { "thumbnail": format!("https://catalog.test/{}.jpg", isbn) },
            "industryIdentifiers": [{ "type": "ISBN_13", "identifier": isbn }],
            "publisher": "Test Press",
            "publishedDate": "2001-01-01",
            "description": format!("About {}", title)
        }
    })
}

/// Store over an in-memory database and a temporary cover directory
pub async fn test_store(catalog: Option<Arc<CatalogClient>>) -> (BookStore, TempDir) {
    let pool = init_in_memory().await.unwrap();
    let dir = TempDir::new().unwrap();
    let covers = Arc::new(CoverCache::new(dir.path().join("covers")).unwrap());
    (BookStore::new(pool, catalog, covers), dir)
}
