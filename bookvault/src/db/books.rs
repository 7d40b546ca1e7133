//! Book database operations
//!
//! Rows are keyed by (title, author), exact match. Updates that touch no row
//! report `Error::NotFound`; callers decide whether that matters.

use bookvault_common::{Book, CatalogMetadata, Error, NewBook, ReadingStatus, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const BOOK_COLUMNS: &str = "id, title, author, cover, status, rating, last_status_change, \
     isbn, series, publisher, published_date, description, self_link, ebookpath, physical_copy";

fn row_to_book(row: &SqliteRow) -> Result<Book> {
    let status: String = row.get("status");
    let status = status.trim().parse::<ReadingStatus>().map_err(|_| {
        Error::Internal(format!("Stored status '{}' is outside the known set", status))
    })?;

    Ok(Book {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        cover: row.get("cover"),
        status,
        rating: row.get("rating"),
        last_status_change: row.get("last_status_change"),
        metadata: CatalogMetadata {
            isbn: row.get("isbn"),
            series: row.get("series"),
            publisher: row.get("publisher"),
            published_date: row.get("published_date"),
            description: row.get("description"),
            self_link: row.get("self_link"),
        },
        ebookpath: row.get("ebookpath"),
        physical_copy: row.get("physical_copy"),
    })
}

/// Insert a book, or refresh cover and catalog metadata of an existing one
///
/// On conflict only cover and metadata are replaced. Status, rating and
/// last_status_change of the existing row are left untouched whatever the
/// incoming status is. Returns the row id.
pub async fn upsert_book(pool: &SqlitePool, book: &NewBook, now: &str) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO books (
            title, author, cover, status, last_status_change,
            isbn, series, publisher, published_date, description, self_link
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(title, author) DO UPDATE SET
            cover = excluded.cover,
            isbn = excluded.isbn,
            series = excluded.series,
            publisher = excluded.publisher,
            published_date = excluded.published_date,
            description = excluded.description,
            self_link = excluded.self_link
        RETURNING id
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.cover)
    .bind(book.status.as_str())
    .bind(now)
    .bind(&book.metadata.isbn)
    .bind(&book.metadata.series)
    .bind(&book.metadata.publisher)
    .bind(&book.metadata.published_date)
    .bind(&book.metadata.description)
    .bind(&book.metadata.self_link)
    .fetch_one(pool)
    .await
    .map_err(|e| Error::from_write(e, &format!("book '{}' by '{}'", book.title, book.author)))?;

    Ok(id)
}

/// Set status and stamp the change time
pub async fn update_status(
    pool: &SqlitePool,
    title: &str,
    author: &str,
    status: ReadingStatus,
    now: &str,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE books SET status = ?, last_status_change = ? WHERE title = ? AND author = ?",
    )
    .bind(status.as_str())
    .bind(now)
    .bind(title)
    .bind(author)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("book '{}' by '{}'", title, author)));
    }
    Ok(())
}

/// Set status and rating and stamp the change time
pub async fn update_status_and_rating(
    pool: &SqlitePool,
    title: &str,
    author: &str,
    status: ReadingStatus,
    rating: i64,
    now: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE books SET status = ?, rating = ?, last_status_change = ?
        WHERE title = ? AND author = ?
        "#,
    )
    .bind(status.as_str())
    .bind(rating)
    .bind(now)
    .bind(title)
    .bind(author)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("book '{}' by '{}'", title, author)));
    }
    Ok(())
}

/// Hard delete; tag links go with it via cascade
pub async fn delete_book(pool: &SqlitePool, title: &str, author: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM books WHERE title = ? AND author = ?")
        .bind(title)
        .bind(author)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("book '{}' by '{}'", title, author)));
    }
    Ok(())
}

/// All books in id order
pub async fn load_all_books(pool: &SqlitePool) -> Result<Vec<Book>> {
    let rows = sqlx::query(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_book).collect()
}

/// Load book by id
pub async fn load_book(pool: &SqlitePool, book_id: i64) -> Result<Option<Book>> {
    let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS))
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_book).transpose()
}

/// Books that carry every one of `tag_ids` (AND semantics)
///
/// `tag_ids` must be non-empty and free of duplicates: the match count of
/// each book is compared against its length.
pub async fn load_books_with_all_tags(pool: &SqlitePool, tag_ids: &[i64]) -> Result<Vec<Book>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM books WHERE id IN (SELECT book_id FROM book_tags WHERE tag_id IN (",
        BOOK_COLUMNS
    ));

    let mut ids = builder.separated(", ");
    for tag_id in tag_ids {
        ids.push_bind(*tag_id);
    }
    ids.push_unseparated(") GROUP BY book_id HAVING COUNT(DISTINCT tag_id) = ");

    builder.push_bind(tag_ids.len() as i64);
    builder.push(") ORDER BY id");

    let rows = builder.build().fetch_all(pool).await?;

    rows.iter().map(row_to_book).collect()
}

/// Set (or clear) the ebook file path
pub async fn set_ebook_path(pool: &SqlitePool, book_id: i64, path: Option<&str>) -> Result<()> {
    let result = sqlx::query("UPDATE books SET ebookpath = ? WHERE id = ?")
        .bind(path)
        .bind(book_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("book {}", book_id)));
    }
    Ok(())
}

/// Ebook file path of a book (`NotFound` if the book does not exist)
pub async fn get_ebook_path(pool: &SqlitePool, book_id: i64) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT ebookpath FROM books WHERE id = ?")
            .bind(book_id)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((path,)) => Ok(path),
        None => Err(Error::NotFound(format!("book {}", book_id))),
    }
}

/// Set the physical-copy flag
pub async fn set_physical_copy(pool: &SqlitePool, book_id: i64, physical_copy: bool) -> Result<()> {
    let result = sqlx::query("UPDATE books SET physical_copy = ? WHERE id = ?")
        .bind(physical_copy)
        .bind(book_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("book {}", book_id)));
    }
    Ok(())
}
