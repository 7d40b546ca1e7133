//! Core services

pub mod book_store;
pub mod catalog_client;
pub mod cover_cache;
pub mod stats;

pub use book_store::BookStore;
pub use catalog_client::CatalogClient;
pub use cover_cache::CoverCache;
pub use stats::LibraryStats;
