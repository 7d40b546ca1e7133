//! HTTP API handlers
//!
//! A thin JSON adapter over the core services.

pub mod books;
pub mod catalog;
pub mod health;
pub mod stats;
pub mod tags;

pub use books::book_routes;
pub use catalog::catalog_routes;
pub use health::health_routes;
pub use stats::stats_routes;
pub use tags::tag_routes;
