//! Library statistics
//!
//! Pure aggregation over the records returned by [`BookStore::list_all`].
//! Only current state is visible: a book that was Read and later moved to
//! another status contributes to no year.

use bookvault_common::{BookRecord, ReadingStatus, Result};
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::services::book_store::BookStore;
use bookvault_common::models::TIMESTAMP_FORMAT;

/// Summary counts over the whole library
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total_books: usize,
    pub status_counts: BTreeMap<String, usize>,
    /// Keyed by the joined author string; co-authored books form one key
    pub author_counts: BTreeMap<String, usize>,
    pub read_by_year: BTreeMap<i32, usize>,
    pub tag_counts: BTreeMap<String, usize>,
}

impl LibraryStats {
    /// (total, status, author, read-by-year, tag) tuple
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        usize,
        BTreeMap<String, usize>,
        BTreeMap<String, usize>,
        BTreeMap<i32, usize>,
        BTreeMap<String, usize>,
    ) {
        (
            self.total_books,
            self.status_counts,
            self.author_counts,
            self.read_by_year,
            self.tag_counts,
        )
    }
}

/// Calendar year of a `last_status_change` value
fn year_of(timestamp: &str) -> Option<i32> {
    let timestamp = timestamp.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT) {
        return Some(parsed.year());
    }
    // Older rows may carry a date only or another separator
    timestamp.get(..4)?.parse().ok()
}

/// Aggregate counts over a set of book records
pub fn aggregate(records: &[BookRecord]) -> LibraryStats {
    let mut stats = LibraryStats {
        total_books: records.len(),
        ..Default::default()
    };

    for record in records {
        *stats
            .status_counts
            .entry(record.status.as_str().trim().to_string())
            .or_default() += 1;

        *stats
            .author_counts
            .entry(record.author.trim().to_string())
            .or_default() += 1;

        if record.status == ReadingStatus::Read {
            if let Some(year) = record.last_status_change.as_deref().and_then(year_of) {
                *stats.read_by_year.entry(year).or_default() += 1;
            }
        }

        for tag in &record.tags {
            *stats.tag_counts.entry(tag.name.clone()).or_default() += 1;
        }
    }

    stats
}

impl BookStore {
    /// Statistics over every book currently in the store
    pub async fn compute_stats(&self) -> Result<LibraryStats> {
        let records = self.list_all().await?;
        Ok(aggregate(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookvault_common::BookTag;

    fn record(id: i64, author: &str, status: ReadingStatus, changed: Option<&str>) -> BookRecord {
        BookRecord {
            id,
            title: format!("Book {}", id),
            author: author.to_string(),
            cover: None,
            status,
            rating: 0,
            last_status_change: changed.map(str::to_string),
            isbn: None,
            series: None,
            publisher: None,
            published_date: None,
            description: None,
            self_link: None,
            ebookpath: None,
            physical_copy: false,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_year_of() {
        assert_eq!(year_of("2023-06-01 10:00:00"), Some(2023));
        assert_eq!(year_of("2021-02-03"), Some(2021));
        assert_eq!(year_of("soon"), None);
        assert_eq!(year_of(""), None);
    }

    #[test]
    fn test_counts() {
        let mut tagged = record(1, "Frank Herbert ", ReadingStatus::Read, Some("2023-06-01 10:00:00"));
        tagged.tags.push(BookTag {
            id: 1,
            name: "sf".to_string(),
            color: "#6c757d".to_string(),
        });

        let records = vec![
            tagged,
            record(2, "Frank Herbert", ReadingStatus::Dnf, Some("2022-01-01 00:00:00")),
            record(3, "Terry Pratchett, Neil Gaiman", ReadingStatus::Read, None),
        ];
        let stats = aggregate(&records);

        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.status_counts["Read"], 2);
        assert_eq!(stats.status_counts["DNF"], 1);
        assert_eq!(stats.author_counts["Frank Herbert"], 2);
        assert_eq!(stats.author_counts["Terry Pratchett, Neil Gaiman"], 1);
        assert_eq!(stats.read_by_year.len(), 1);
        assert_eq!(stats.read_by_year[&2023], 1);
        assert_eq!(stats.tag_counts["sf"], 1);
    }

    #[test]
    fn test_empty_library() {
        let (total, statuses, authors, years, tags) = aggregate(&[]).into_parts();
        assert_eq!(total, 0);
        assert!(statuses.is_empty() && authors.is_empty() && years.is_empty() && tags.is_empty());
    }
}
