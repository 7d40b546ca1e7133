//! On-disk cover image cache
//!
//! A flat directory with one file per book id. The cache is keyed by id,
//! not URL: once `<dir>/<id>` exists it is served as-is, even if the book's
//! cover URL has changed since. Files are written at most once per id and
//! never evicted.
//!
//! Writes are not synchronized. Two concurrent misses for the same id may
//! both download and write the same bytes.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("BookVault/", env!("CARGO_PKG_VERSION"));

/// URL prefix the cache directory is served under
pub const COVER_ROUTE: &str = "cover_cache";

/// Cover download errors (internal; collapsed to "no cover")
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write-once cover cache
pub struct CoverCache {
    dir: PathBuf,
    http_client: reqwest::Client,
}

impl CoverCache {
    /// Create the cache, making sure its directory exists
    pub fn new(dir: impl Into<PathBuf>) -> bookvault_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| bookvault_common::Error::Internal(format!("HTTP client: {}", e)))?;

        Self::with_client(dir, http_client)
    }

    /// Create the cache with a caller-supplied HTTP client
    pub fn with_client(
        dir: impl Into<PathBuf>,
        http_client: reqwest::Client,
    ) -> bookvault_common::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, http_client })
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of a book's cached cover (whether or not it exists yet)
    pub fn path_for(&self, book_id: i64) -> PathBuf {
        self.dir.join(book_id.to_string())
    }

    /// Location a cached cover is served from, relative to the site root
    pub fn served_path(book_id: i64) -> String {
        format!("{}/{}", COVER_ROUTE, book_id)
    }

    /// Local path of the book's cover, downloading it on first use
    ///
    /// Returns `None` when there is no URL or the download fails.
    pub async fn resolve(&self, book_id: i64, cover_url: &str) -> Option<PathBuf> {
        // A book without a cover URL has no cover, whatever sits on disk
        if cover_url.trim().is_empty() {
            return None;
        }

        let path = self.path_for(book_id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Some(path);
        }

        match self.download(cover_url, &path).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(book_id, url = %cover_url, error = %e, "Cover download failed");
                None
            }
        }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<(), CoverError> {
        debug!(url = %url, path = %path.display(), "Fetching cover");

        let response = self.http_client.get(url).send().await?;

        // Only a plain 200 counts as a cover
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CoverError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;

        // Directory may have been removed since construction
        tokio::fs::create_dir_all(&self.dir).await?;

        // Only a complete file may appear at the final path
        let partial = path.with_extension("tmp");
        if let Err(e) = tokio::fs::write(&partial, &bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        tokio::fs::rename(&partial, path).await?;

        info!(path = %path.display(), bytes = bytes.len(), "Cached cover");
        Ok(())
    }
}
