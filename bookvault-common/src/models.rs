//! Book, tag and catalog record types
//!
//! Field names on the wire follow the catalog's camelCase for
//! `publishedDate` and `selfLink`; everything else is snake_case.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Timestamp layout used for `last_status_change`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time in [`TIMESTAMP_FORMAT`]
pub fn current_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Reading-progress state of a book
///
/// All transitions are allowed; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[default]
    #[serde(rename = "TBR")]
    Tbr,
    Reading,
    Read,
    #[serde(rename = "DNF")]
    Dnf,
}

impl ReadingStatus {
    /// Every valid status, in display order
    pub const ALL: [ReadingStatus; 4] = [
        ReadingStatus::Tbr,
        ReadingStatus::Reading,
        ReadingStatus::Read,
        ReadingStatus::Dnf,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Tbr => "TBR",
            ReadingStatus::Reading => "Reading",
            ReadingStatus::Read => "Read",
            ReadingStatus::Dnf => "DNF",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = Error;

    /// Exact match against the closed set (no case folding)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown status: {}", s)))
    }
}

/// Catalog metadata fields a book can be enriched with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub isbn: Option<String>,
    pub series: Option<String>,
    pub publisher: Option<String>,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "selfLink")]
    pub self_link: Option<String>,
}

/// One normalized catalog search hit (never persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResult {
    pub title: String,
    /// Authors joined with ", "
    pub author: String,
    /// Thumbnail URL, or the placeholder when the catalog has none
    pub cover: String,
    #[serde(flatten)]
    pub metadata: CatalogMetadata,
}

/// Book as submitted for upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub status: ReadingStatus,
    #[serde(flatten)]
    pub metadata: CatalogMetadata,
}

impl NewBook {
    /// Book with only the required fields set
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            cover: None,
            status: ReadingStatus::default(),
            metadata: CatalogMetadata::default(),
        }
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_status(mut self, status: ReadingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.metadata.isbn = Some(isbn.into());
        self
    }

    /// Build an upsert request from a selected catalog hit
    pub fn from_catalog(result: CatalogResult, status: ReadingStatus) -> Self {
        Self {
            title: result.title,
            author: result.author,
            cover: Some(result.cover),
            status,
            metadata: result.metadata,
        }
    }
}

/// Persisted book row
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Catalog cover URL
    pub cover: Option<String>,
    pub status: ReadingStatus,
    pub rating: i64,
    pub last_status_change: Option<String>,
    pub metadata: CatalogMetadata,
    pub ebookpath: Option<String>,
    pub physical_copy: bool,
}

/// Tag definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub created_at: String,
}

/// Tag as attached to a book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTag {
    pub id: i64,
    pub name: String,
    pub color: String,
}

/// Flat book record handed to callers of the store
///
/// `cover` holds the served location of the cached image
/// (`cover_cache/<id>`), resolved at read time, not the catalog URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub cover: Option<String>,
    pub status: ReadingStatus,
    pub rating: i64,
    pub last_status_change: Option<String>,
    pub isbn: Option<String>,
    pub series: Option<String>,
    pub publisher: Option<String>,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "selfLink")]
    pub self_link: Option<String>,
    pub ebookpath: Option<String>,
    pub physical_copy: bool,
    pub tags: Vec<BookTag>,
}

impl BookRecord {
    /// Combine a stored row with its resolved cover path and tags
    pub fn from_book(book: Book, cover_path: Option<String>, tags: Vec<BookTag>) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            cover: cover_path,
            status: book.status,
            rating: book.rating,
            last_status_change: book.last_status_change,
            isbn: book.metadata.isbn,
            series: book.metadata.series,
            publisher: book.metadata.publisher,
            published_date: book.metadata.published_date,
            description: book.metadata.description,
            self_link: book.metadata.self_link,
            ebookpath: book.ebookpath,
            physical_copy: book.physical_copy,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_exact() {
        assert_eq!("TBR".parse::<ReadingStatus>().unwrap(), ReadingStatus::Tbr);
        assert_eq!("DNF".parse::<ReadingStatus>().unwrap(), ReadingStatus::Dnf);
        assert!("tbr".parse::<ReadingStatus>().is_err());
        assert!("Finished".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_stored_form() {
        for status in ReadingStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_book_record_keys() {
        let book = Book {
            id: 7,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            cover: Some("http://covers/dune.jpg".to_string()),
            status: ReadingStatus::Read,
            rating: 5,
            last_status_change: Some("2023-06-01 10:00:00".to_string()),
            metadata: CatalogMetadata {
                isbn: Some("9780441013593".to_string()),
                ..Default::default()
            },
            ebookpath: None,
            physical_copy: true,
        };
        let record = BookRecord::from_book(book, Some("cover_cache/7".to_string()), vec![]);
        let value = serde_json::to_value(&record).unwrap();

        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        let mut expected = vec![
            "id", "title", "author", "cover", "status", "rating", "last_status_change",
            "isbn", "series", "publisher", "publishedDate", "description", "selfLink",
            "ebookpath", "physical_copy", "tags",
        ];
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(value["cover"], "cover_cache/7");
        assert_eq!(value["status"], "Read");
    }

    #[test]
    fn test_new_book_deserializes_catalog_shape() {
        let book: NewBook = serde_json::from_str(
            r#"{"title":"Dune","author":"Frank Herbert","cover":"http://c","publishedDate":"1965","selfLink":"http://s"}"#,
        )
        .unwrap();
        assert_eq!(book.status, ReadingStatus::Tbr);
        assert_eq!(book.metadata.published_date.as_deref(), Some("1965"));
        assert_eq!(book.metadata.self_link.as_deref(), Some("http://s"));
        assert!(book.metadata.isbn.is_none());
    }
}
