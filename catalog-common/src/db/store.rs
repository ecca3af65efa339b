//! Generic persistent-store primitives
//!
//! [`Database`] only exists once a connection is established and the schema
//! is in place, so callers never hold a store that failed to open.

use super::init::{init_database_pool, init_memory_pool};
use super::value::SqlValue;
use crate::{Error, Result};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqlitePool, SqliteRow};
use sqlx::{Row, Transaction, TypeInfo, ValueRef};
use std::path::Path;
use tracing::{debug, info};

/// Handle to the catalog database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database file and ensure the required tables exist
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = init_database_pool(db_path).await?;
        info!("Connection is open");
        Ok(Self { pool })
    }

    /// Open a fresh in-memory database (tests, dry runs)
    pub async fn open_in_memory() -> Result<Self> {
        let pool = init_memory_pool().await?;
        debug!("In-memory connection is open");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction; dropping it without commit rolls back
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Release all connections. Committed work is already durable.
    pub async fn close(self) {
        self.pool.close().await;
        info!("Connection is closed");
    }

    /// Select `columns` from `table` in insertion order
    ///
    /// With `limit = Some(n)` only the last `n` inserted rows are returned.
    /// "Last" is positional (rowid order), not based on any timestamp column.
    pub async fn read(
        &self,
        columns: &[&str],
        table: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Vec<SqlValue>>> {
        validate_identifier(table)?;
        if columns.is_empty() {
            return Err(Error::InvalidInput("read requires at least one column".to_string()));
        }
        for column in columns {
            validate_identifier(column)?;
        }

        let sql = format!("SELECT {} FROM {} ORDER BY rowid", columns.join(", "), table);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut decoded = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
        if let Some(n) = limit {
            let start = decoded.len().saturating_sub(n);
            decoded.drain(..start);
        }
        Ok(decoded)
    }

    /// Insert one row with bound parameters
    pub async fn write_row(
        &self,
        table: &str,
        columns: &[&str],
        values: Vec<SqlValue>,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_row(&mut conn, table, columns, values).await
    }

    /// Run an arbitrary statement, returning the number of rows affected
    pub async fn execute(&self, statement: &str) -> Result<u64> {
        let result = sqlx::query(statement).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Insert one row on an existing connection or transaction
pub async fn insert_row(
    conn: &mut SqliteConnection,
    table: &str,
    columns: &[&str],
    values: Vec<SqlValue>,
) -> Result<()> {
    let sql = insert_statement(table, columns, values.len())?;
    let mut query = sqlx::query(&sql);
    for value in values {
        query = bind_value(query, value);
    }
    query.execute(&mut *conn).await?;
    Ok(())
}

/// Build `INSERT INTO table (a, b) VALUES (?, ?)` after checking identifiers
pub fn insert_statement(table: &str, columns: &[&str], value_count: usize) -> Result<String> {
    validate_identifier(table)?;
    if columns.is_empty() {
        return Err(Error::InvalidInput("insert requires at least one column".to_string()));
    }
    if columns.len() != value_count {
        return Err(Error::InvalidInput(format!(
            "{} columns but {} values for table {}",
            columns.len(),
            value_count,
            table
        )));
    }
    for column in columns {
        validate_identifier(column)?;
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    ))
}

/// Bind a dynamic value onto a query
pub fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
    }
}

/// Table and column names are interpolated, so only plain identifiers pass
fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("Invalid SQL identifier: '{}'", name)))
    }
}

fn decode_row(row: &SqliteRow) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|i| decode_column(row, i)).collect()
}

fn decode_column(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "INT8" | "BOOLEAN" => {
            SqlValue::Integer(row.try_get::<i64, _>(index)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" => SqlValue::Real(row.try_get::<f64, _>(index)?),
        "TEXT" | "DATE" | "DATETIME" | "TIME" => SqlValue::Text(row.try_get::<String, _>(index)?),
        other => {
            return Err(Error::Internal(format!(
                "Unsupported column type {} at index {}",
                other, index
            )))
        }
    };
    Ok(value)
}
