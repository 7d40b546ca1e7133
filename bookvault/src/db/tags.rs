//! Tag database operations

use bookvault_common::{BookTag, Error, Result, Tag};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

/// Default tag color
pub const DEFAULT_TAG_COLOR: &str = "#6c757d";

/// Create a tag (`Conflict` if the name is taken)
pub async fn create_tag(pool: &SqlitePool, name: &str, color: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO tags (name, color) VALUES (?, ?)")
        .bind(name)
        .bind(color)
        .execute(pool)
        .await
        .map_err(|e| Error::from_write(e, &format!("tag '{}'", name)))?;

    Ok(result.last_insert_rowid())
}

/// All tags ordered by name
pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, name, color, created_at FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| Tag {
            id: row.get("id"),
            name: row.get("name"),
            color: row.get("color"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Rename and recolor a tag
pub async fn update_tag(pool: &SqlitePool, tag_id: i64, name: &str, color: &str) -> Result<()> {
    let result = sqlx::query("UPDATE tags SET name = ?, color = ? WHERE id = ?")
        .bind(name)
        .bind(color)
        .bind(tag_id)
        .execute(pool)
        .await
        .map_err(|e| Error::from_write(e, &format!("tag '{}'", name)))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("tag {}", tag_id)));
    }
    Ok(())
}

/// Delete a tag; its book links are removed by cascade
pub async fn delete_tag(pool: &SqlitePool, tag_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(tag_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("tag {}", tag_id)));
    }
    Ok(())
}

/// Link a tag to a book; linking twice is a no-op
pub async fn attach_tag(pool: &SqlitePool, book_id: i64, tag_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO book_tags (book_id, tag_id) VALUES (?, ?) ON CONFLICT(book_id, tag_id) DO NOTHING",
    )
    .bind(book_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            Error::NotFound(format!("book {} or tag {}", book_id, tag_id))
        }
        other => Error::Database(other),
    })?;

    Ok(())
}

/// Unlink a tag from a book (`NotFound` if they were not linked)
pub async fn detach_tag(pool: &SqlitePool, book_id: i64, tag_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM book_tags WHERE book_id = ? AND tag_id = ?")
        .bind(book_id)
        .bind(tag_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("tag {} on book {}", tag_id, book_id)));
    }
    Ok(())
}

/// Tags of every tagged book, keyed by book id, each list ordered by name
pub async fn load_tags_by_book(pool: &SqlitePool) -> Result<HashMap<i64, Vec<BookTag>>> {
    let rows = sqlx::query(
        r#"
        SELECT bt.book_id, t.id, t.name, t.color
        FROM book_tags bt
        JOIN tags t ON t.id = bt.tag_id
        ORDER BY bt.book_id, t.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_book: HashMap<i64, Vec<BookTag>> = HashMap::new();
    for row in rows {
        by_book.entry(row.get("book_id")).or_default().push(BookTag {
            id: row.get("id"),
            name: row.get("name"),
            color: row.get("color"),
        });
    }

    Ok(by_book)
}
