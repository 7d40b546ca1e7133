//! Google Books catalog client
//!
//! Searches the external volumes endpoint and normalizes its loosely-shaped
//! JSON into flat [`CatalogResult`] records. Every field of the response is
//! treated as optional.
//!
//! Failures never reach the caller: a non-success status, a transport error
//! or an undecodable body is logged and yields an empty result. There is no
//! retry and no timeout beyond the HTTP client defaults.

use bookvault_common::config::CatalogConfig;
use bookvault_common::{CatalogMetadata, CatalogResult};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("BookVault/", env!("CARGO_PKG_VERSION"));

/// Cover used when the catalog has no thumbnail
pub const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/128x195?text=No+Cover";
pub const UNKNOWN_TITLE: &str = "Unknown title";
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Catalog client errors (internal; collapsed to empty results)
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}")]
    ApiError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Volumes search response
#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Option<Vec<VolumeItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeItem {
    volume_info: Option<VolumeInfo>,
    series_info: Option<SeriesInfo>,
    self_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Option<Vec<String>>,
    image_links: Option<ImageLinks>,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    series_info: Option<SeriesInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    id_type: Option<String>,
    identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SeriesInfo {
    title: Option<String>,
}

/// First identifier whose type mentions ISBN (ISBN_13, ISBN_10, ...)
fn extract_isbn(identifiers: Option<Vec<IndustryIdentifier>>) -> Option<String> {
    identifiers?
        .into_iter()
        .find(|id| id.id_type.as_deref().is_some_and(|t| t.contains("ISBN")))
        .and_then(|id| id.identifier)
}

/// Flatten one catalog item, filling the documented defaults
fn normalize_item(item: VolumeItem) -> CatalogResult {
    let info = item.volume_info.unwrap_or_default();

    let author = match info.authors {
        Some(authors) if !authors.is_empty() => authors.join(", "),
        _ => UNKNOWN_AUTHOR.to_string(),
    };

    let cover = info
        .image_links
        .and_then(|links| links.thumbnail)
        .unwrap_or_else(|| PLACEHOLDER_COVER.to_string());

    let series = item
        .series_info
        .and_then(|s| s.title)
        .or_else(|| info.series_info.and_then(|s| s.title))
        .or(info.subtitle);

    CatalogResult {
        title: info.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        author,
        cover,
        metadata: CatalogMetadata {
            isbn: extract_isbn(info.industry_identifiers),
            series,
            publisher: info.publisher,
            published_date: info.published_date,
            description: info.description,
            self_link: item.self_link,
        },
    }
}

/// Catalog API client
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    max_results: u32,
    isbn_max_results: u32,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            max_results: config.max_results,
            isbn_max_results: config.isbn_max_results,
        })
    }

    /// Default result cap for free-text searches
    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Free-text search
    pub async fn search_by_text(&self, query: &str, max_results: u32) -> Vec<CatalogResult> {
        self.search(query, max_results).await
    }

    /// Search by ISBN (`isbn:` query prefix)
    pub async fn search_by_isbn(&self, isbn: &str) -> Vec<CatalogResult> {
        self.search(&format!("isbn:{}", isbn), self.isbn_max_results)
            .await
    }

    /// Metadata of the best title+author match, used to backfill a book
    pub async fn lookup_metadata_by_title_author(
        &self,
        title: &str,
        author: &str,
    ) -> Option<CatalogMetadata> {
        let query = format!("intitle:{} inauthor:{}", title, author);
        self.search(&query, 1)
            .await
            .into_iter()
            .next()
            .map(|result| result.metadata)
    }

    /// Metadata of the first ISBN match
    pub async fn lookup_metadata_by_isbn(&self, isbn: &str) -> Option<CatalogMetadata> {
        self.search(&format!("isbn:{}", isbn), 1)
            .await
            .into_iter()
            .next()
            .map(|result| result.metadata)
    }

    async fn search(&self, query: &str, max_results: u32) -> Vec<CatalogResult> {
        match self.fetch(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                warn!(query = %query, error = %e, "Catalog search failed, returning no results");
                Vec::new()
            }
        }
    }

    async fn fetch(&self, query: &str, max_results: u32) -> Result<Vec<CatalogResult>, CatalogError> {
        debug!(query = %query, max_results, url = %self.base_url, "Querying catalog");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("q", query.to_string()), ("maxResults", max_results.to_string())])
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::ApiError(status.as_u16()));
        }

        let body: VolumesResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        let results: Vec<CatalogResult> = body
            .items
            .unwrap_or_default()
            .into_iter()
            .map(normalize_item)
            .collect();

        debug!(query = %query, count = results.len(), "Catalog search complete");
        Ok(results)
    }
}
