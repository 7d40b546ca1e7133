//! Database schema migrations
//!
//! Versioned schema migrations applied once at startup, before any store
//! component is constructed. Progress is tracked in the `schema_version`
//! table; every step is idempotent, so a database created by an older build
//! (including one that grew its columns ad hoc) converges on the same schema.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - append a new one instead
//! 2. **Use ADD COLUMN steps** for new columns so existing rows survive
//! 3. **Bump nothing by hand** - the target version is the last entry of
//!    [`MIGRATIONS`]

use crate::Result;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

/// One idempotent schema change
#[derive(Debug)]
pub enum Step {
    /// Statement that is safe to repeat (`CREATE ... IF NOT EXISTS`)
    Sql(&'static str),
    /// `ALTER TABLE .. ADD COLUMN`, skipped when the column already exists
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

/// A numbered group of steps applied in one transaction
#[derive(Debug)]
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub steps: &'static [Step],
}

/// Ordered migration list
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Create books table",
        steps: &[Step::Sql(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                cover TEXT,
                status TEXT NOT NULL DEFAULT 'TBR'
                    CHECK (status IN ('TBR', 'Reading', 'Read', 'DNF')),
                last_status_change TEXT,
                UNIQUE (title, author)
            )
            "#,
        )],
    },
    Migration {
        version: 2,
        description: "Add rating and last_status_change to books",
        steps: &[
            Step::AddColumn {
                table: "books",
                column: "rating",
                definition: "INTEGER NOT NULL DEFAULT 0",
            },
            Step::AddColumn {
                table: "books",
                column: "last_status_change",
                definition: "TEXT",
            },
        ],
    },
    Migration {
        version: 3,
        description: "Add catalog metadata columns to books",
        steps: &[
            Step::AddColumn { table: "books", column: "isbn", definition: "TEXT" },
            Step::AddColumn { table: "books", column: "series", definition: "TEXT" },
            Step::AddColumn { table: "books", column: "publisher", definition: "TEXT" },
            Step::AddColumn { table: "books", column: "published_date", definition: "TEXT" },
            Step::AddColumn { table: "books", column: "description", definition: "TEXT" },
            Step::AddColumn { table: "books", column: "self_link", definition: "TEXT" },
        ],
    },
    Migration {
        version: 4,
        description: "Add ebook path and physical copy flag to books",
        steps: &[
            Step::AddColumn { table: "books", column: "ebookpath", definition: "TEXT" },
            Step::AddColumn {
                table: "books",
                column: "physical_copy",
                definition: "INTEGER NOT NULL DEFAULT 0",
            },
        ],
    },
    Migration {
        version: 5,
        description: "Create tags and book_tags tables",
        steps: &[
            Step::Sql(
                r#"
                CREATE TABLE IF NOT EXISTS tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    color TEXT NOT NULL DEFAULT '#6c757d',
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            ),
            Step::Sql(
                r#"
                CREATE TABLE IF NOT EXISTS book_tags (
                    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                    PRIMARY KEY (book_id, tag_id)
                )
                "#,
            ),
            Step::Sql("CREATE INDEX IF NOT EXISTS idx_book_tags_tag ON book_tags(tag_id)"),
        ],
    },
];

/// Version the schema reaches once every migration has run
pub fn latest_schema_version() -> i32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Get current schema version from database (0 when nothing was applied)
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn has_column(conn: &mut SqliteConnection, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count > 0)
}

async fn apply_step(conn: &mut SqliteConnection, step: &Step) -> Result<()> {
    match step {
        Step::Sql(sql) => {
            sqlx::query(*sql).execute(&mut *conn).await?;
        }
        Step::AddColumn {
            table,
            column,
            definition,
        } => {
            if has_column(conn, table, column).await? {
                debug!("  {}.{} already exists - skipping", table, column);
                return Ok(());
            }
            let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition);
            sqlx::query(&sql).execute(&mut *conn).await?;
            info!("  ✓ Added {}.{}", table, column);
        }
    }
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    let current_version = get_schema_version(pool).await?;
    let target_version = latest_schema_version();

    if current_version == target_version {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > target_version {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, target_version
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, target_version
    );

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!("Running migration v{}: {}", migration.version, migration.description);

        let mut tx = pool.begin().await?;
        for step in migration.steps {
            apply_step(&mut *tx, step).await?;
        }
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("✓ Migration v{} completed", migration.version);
    }

    info!("All migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn single_connection_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database")
    }

    async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
            .bind(table)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_versions_strictly_increase() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(latest_schema_version(), *versions.last().unwrap());
    }

    #[tokio::test]
    async fn test_fresh_database_reaches_latest_version() {
        let pool = single_connection_pool().await;

        run_migrations(&pool).await.unwrap();

        assert_eq!(get_schema_version(&pool).await.unwrap(), latest_schema_version());
        let columns = column_names(&pool, "books").await;
        for expected in ["rating", "isbn", "self_link", "ebookpath", "physical_copy"] {
            assert!(columns.iter().any(|c| c == expected), "missing column {}", expected);
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = single_connection_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, latest_schema_version() as i64);
    }

    #[tokio::test]
    async fn test_legacy_books_table_is_upgraded_in_place() {
        let pool = single_connection_pool().await;

        // Shape of a database created before rating/metadata existed
        sqlx::query(
            r#"
            CREATE TABLE books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                cover TEXT,
                status TEXT NOT NULL DEFAULT 'TBR',
                UNIQUE (title, author)
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO books (title, author, status) VALUES ('Dune', 'Frank Herbert', 'Read')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();

        let (status, rating, change): (String, i64, Option<String>) = sqlx::query_as(
            "SELECT status, rating, last_status_change FROM books WHERE title = 'Dune'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(status, "Read");
        assert_eq!(rating, 0);
        assert!(change.is_none());
    }
}
