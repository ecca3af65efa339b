//! Database initialization
//!
//! Opens (or creates) the SQLite database and makes sure the ledger and the
//! three catalog tables exist. Table creation is idempotent and never
//! destructive; there are no migrations.

use crate::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Ledger of data links that were fully ingested
pub const PROCESSED_TABLE: &str = "processed";
pub const SONGS_TABLE: &str = "songs";
pub const MOVIES_TABLE: &str = "movies";
pub const APPS_TABLE: &str = "apps";

/// Open a connection pool for the database file, creating it if missing
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database
///
/// Every SQLite memory connection is its own database, so the pool is
/// pinned to a single connection that never expires.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create the ledger and catalog tables if they are absent
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_processed_table(pool).await?;
    create_songs_table(pool).await?;
    create_movies_table(pool).await?;
    create_apps_table(pool).await?;
    Ok(())
}

async fn create_processed_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processed (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            data_links TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            artist_name TEXT,
            title TEXT,
            year INTEGER,
            release TEXT,
            ingestion_time TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            original_title TEXT,
            original_language TEXT,
            budget INTEGER,
            is_adult BOOLEAN,
            release_date DATE,
            original_title_normalized TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_apps_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS apps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            genre TEXT,
            rating REAL,
            version TEXT,
            size_bytes BIGINT,
            is_awesome BOOLEAN
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
