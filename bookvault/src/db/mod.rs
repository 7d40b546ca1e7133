//! Database access for books and tags

pub mod books;
pub mod tags;
