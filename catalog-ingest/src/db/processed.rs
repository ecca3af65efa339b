//! Processed-links ledger

use catalog_common::db::{insert_row, PROCESSED_TABLE};
use catalog_common::{Database, Result};
use sqlx::SqliteConnection;

/// Every link recorded in the ledger, in insertion order
pub async fn load_processed_links(db: &Database) -> Result<Vec<String>> {
    let rows = db.read(&["data_links"], PROCESSED_TABLE, None).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter_map(|value| value.as_text().map(str::to_string))
        .collect())
}

pub async fn is_processed(conn: &mut SqliteConnection, link: &str) -> Result<bool> {
    let found: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM processed WHERE data_links = ?)")
            .bind(link)
            .fetch_one(&mut *conn)
            .await?;
    Ok(found != 0)
}

pub async fn mark_processed(conn: &mut SqliteConnection, link: &str) -> Result<()> {
    insert_row(conn, PROCESSED_TABLE, &["data_links"], vec![link.into()]).await
}
