//! Book store facade
//!
//! Owns the upsert/merge logic on top of the `db` functions: catalog
//! enrichment before insert, cover resolution and tag hydration on read.
//! Write operations return typed errors; the ebook accessors and
//! `create_tag` collapse failures into `bool`/`Option` after logging.

use bookvault_common::{
    current_timestamp, BookRecord, CatalogMetadata, NewBook, ReadingStatus, Result, Tag,
};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::{books, tags};
use crate::services::catalog_client::CatalogClient;
use crate::services::cover_cache::CoverCache;

/// Persistence facade over books, tags and the book-tag relation
#[derive(Clone)]
pub struct BookStore {
    pool: SqlitePool,
    catalog: Option<Arc<CatalogClient>>,
    covers: Arc<CoverCache>,
}

impl BookStore {
    /// `catalog` is optional: without it, upserts store the book as given
    pub fn new(
        pool: SqlitePool,
        catalog: Option<Arc<CatalogClient>>,
        covers: Arc<CoverCache>,
    ) -> Self {
        Self {
            pool,
            catalog,
            covers,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a book or refresh cover and metadata of an existing one
    ///
    /// Missing catalog metadata is looked up first. An existing row keeps
    /// its status, rating and last_status_change.
    pub async fn upsert(&self, mut book: NewBook) -> Result<i64> {
        self.enrich(&mut book).await;

        let id = books::upsert_book(&self.pool, &book, &current_timestamp()).await?;
        info!(id, title = %book.title, author = %book.author, "Upserted book");
        Ok(id)
    }

    async fn enrich(&self, book: &mut NewBook) {
        let Some(catalog) = &self.catalog else {
            return;
        };

        let found = match book.metadata.isbn.as_deref() {
            None => {
                catalog
                    .lookup_metadata_by_title_author(&book.title, &book.author)
                    .await
            }
            Some(isbn) if has_missing_fields(&book.metadata) => {
                catalog.lookup_metadata_by_isbn(isbn).await
            }
            Some(_) => return,
        };

        match found {
            Some(metadata) => {
                debug!(title = %book.title, "Enriching book from catalog");
                fill_missing(&mut book.metadata, metadata);
            }
            None => debug!(title = %book.title, "No catalog metadata found"),
        }
    }

    /// Set status and stamp the change time, even when unchanged
    pub async fn update_status(&self, title: &str, author: &str, status: ReadingStatus) -> Result<()> {
        books::update_status(&self.pool, title, author, status, &current_timestamp()).await?;
        info!(title = %title, author = %author, status = %status, "Updated status");
        Ok(())
    }

    /// Set status and rating and stamp the change time
    pub async fn update_status_and_rating(
        &self,
        title: &str,
        author: &str,
        status: ReadingStatus,
        rating: i64,
    ) -> Result<()> {
        books::update_status_and_rating(
            &self.pool,
            title,
            author,
            status,
            rating,
            &current_timestamp(),
        )
        .await?;
        info!(title = %title, author = %author, status = %status, rating, "Updated status and rating");
        Ok(())
    }

    pub async fn remove(&self, title: &str, author: &str) -> Result<()> {
        books::delete_book(&self.pool, title, author).await?;
        info!(title = %title, author = %author, "Removed book");
        Ok(())
    }

    /// Every book, with cover resolved and tags attached, in id order
    pub async fn list_all(&self) -> Result<Vec<BookRecord>> {
        let rows = books::load_all_books(&self.pool).await?;
        self.hydrate(rows).await
    }

    /// Books carrying every one of `tag_ids`; an empty set means all books
    pub async fn filter_by_tags(&self, tag_ids: &[i64]) -> Result<Vec<BookRecord>> {
        let unique: Vec<i64> = tag_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return self.list_all().await;
        }

        let rows = books::load_books_with_all_tags(&self.pool, &unique).await?;
        self.hydrate(rows).await
    }

    pub async fn find_by_id(&self, book_id: i64) -> Result<Option<BookRecord>> {
        let Some(book) = books::load_book(&self.pool, book_id).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![book]).await?.pop())
    }

    async fn hydrate(&self, rows: Vec<bookvault_common::Book>) -> Result<Vec<BookRecord>> {
        let mut tags_by_book = tags::load_tags_by_book(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for book in rows {
            let cover_path = self
                .covers
                .resolve(book.id, book.cover.as_deref().unwrap_or_default())
                .await
                .map(|_| CoverCache::served_path(book.id));
            let book_tags = tags_by_book.remove(&book.id).unwrap_or_default();
            records.push(BookRecord::from_book(book, cover_path, book_tags));
        }

        Ok(records)
    }

    /// Returns `false` if the book does not exist or the write failed
    pub async fn set_ebook_path(&self, book_id: i64, path: Option<&str>) -> bool {
        match books::set_ebook_path(&self.pool, book_id, path).await {
            Ok(()) => true,
            Err(e) => {
                warn!(book_id, error = %e, "Failed to set ebook path");
                false
            }
        }
    }

    pub async fn get_ebook_path(&self, book_id: i64) -> Option<String> {
        match books::get_ebook_path(&self.pool, book_id).await {
            Ok(path) => path,
            Err(e) => {
                warn!(book_id, error = %e, "Failed to read ebook path");
                None
            }
        }
    }

    pub async fn set_physical_copy(&self, book_id: i64, physical_copy: bool) -> Result<()> {
        books::set_physical_copy(&self.pool, book_id, physical_copy).await
    }

    /// Create a tag; `None` if the name already exists or the insert failed
    pub async fn create_tag(&self, name: &str, color: Option<&str>) -> Option<i64> {
        let color = color.unwrap_or(tags::DEFAULT_TAG_COLOR);
        match tags::create_tag(&self.pool, name, color).await {
            Ok(id) => {
                info!(id, name = %name, "Created tag");
                Some(id)
            }
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to create tag");
                None
            }
        }
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        tags::list_tags(&self.pool).await
    }

    pub async fn update_tag(&self, tag_id: i64, name: &str, color: &str) -> Result<()> {
        tags::update_tag(&self.pool, tag_id, name, color).await
    }

    /// Delete a tag and unlink it from every book
    pub async fn delete_tag(&self, tag_id: i64) -> Result<()> {
        tags::delete_tag(&self.pool, tag_id).await?;
        info!(tag_id, "Deleted tag");
        Ok(())
    }

    /// Link a tag to a book; repeating the call is a no-op
    pub async fn attach_tag(&self, book_id: i64, tag_id: i64) -> Result<()> {
        tags::attach_tag(&self.pool, book_id, tag_id).await
    }

    pub async fn detach_tag(&self, book_id: i64, tag_id: i64) -> Result<()> {
        tags::detach_tag(&self.pool, book_id, tag_id).await
    }
}

fn has_missing_fields(metadata: &CatalogMetadata) -> bool {
    metadata.series.is_none()
        || metadata.publisher.is_none()
        || metadata.published_date.is_none()
        || metadata.description.is_none()
        || metadata.self_link.is_none()
}

/// Copy fields from `found` into `target` where `target` has none
fn fill_missing(target: &mut CatalogMetadata, found: CatalogMetadata) {
    fn fill(slot: &mut Option<String>, value: Option<String>) {
        if slot.is_none() {
            *slot = value;
        }
    }

    fill(&mut target.isbn, found.isbn);
    fill(&mut target.series, found.series);
    fill(&mut target.publisher, found.publisher);
    fill(&mut target.published_date, found.published_date);
    fill(&mut target.description, found.description);
    fill(&mut target.self_link, found.self_link);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let mut target = CatalogMetadata {
            isbn: Some("111".to_string()),
            ..Default::default()
        };
        fill_missing(
            &mut target,
            CatalogMetadata {
                isbn: Some("222".to_string()),
                publisher: Some("Ace".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(target.isbn.as_deref(), Some("111"));
        assert_eq!(target.publisher.as_deref(), Some("Ace"));
        assert!(target.series.is_none());
    }

    #[test]
    fn test_has_missing_fields() {
        let complete = CatalogMetadata {
            isbn: Some("1".to_string()),
            series: Some("s".to_string()),
            publisher: Some("p".to_string()),
            published_date: Some("d".to_string()),
            description: Some("x".to_string()),
            self_link: Some("l".to_string()),
        };
        assert!(!has_missing_fields(&complete));
        assert!(has_missing_fields(&CatalogMetadata::default()));
    }
}
