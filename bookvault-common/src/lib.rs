//! # BookVault Common Library
//!
//! Shared code for the BookVault backend:
//! - Error type used by the persistence layer
//! - Configuration loading
//! - Database initialization and versioned migrations
//! - Book, tag and catalog record types

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{
    current_timestamp, Book, BookRecord, BookTag, CatalogMetadata, CatalogResult, NewBook,
    ReadingStatus, Tag,
};
