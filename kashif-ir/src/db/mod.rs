//! Database access for kashif-ir
//!
//! SQLite-backed persistence for submitted reports.

pub mod reports;

use kashif_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the database connection pool
///
/// Creates the parent directory and database file when missing and
/// initializes the report table.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize kashif-ir tables
pub(crate) async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // rowid gives list_all() its insertion ordering
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            report_id TEXT PRIMARY KEY,
            draft TEXT NOT NULL,
            decision TEXT,
            status TEXT NOT NULL,
            submitted_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (reports)");

    Ok(())
}
