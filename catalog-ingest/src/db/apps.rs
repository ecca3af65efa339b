//! App persistence

use crate::models::App;
use catalog_common::db::{insert_row, APPS_TABLE};
use catalog_common::Result;
use sqlx::SqliteConnection;

pub const APP_COLUMNS: [&str; 6] = ["name", "genre", "rating", "version", "size_bytes", "is_awesome"];

/// Insert an app with the already-decided `is_awesome` value
pub async fn insert_app(conn: &mut SqliteConnection, app: &App, is_awesome: bool) -> Result<()> {
    insert_row(
        conn,
        APPS_TABLE,
        &APP_COLUMNS,
        vec![
            app.name.as_deref().into(),
            app.genre.as_deref().into(),
            app.rating.into(),
            app.version.as_deref().into(),
            app.size_bytes.into(),
            is_awesome.into(),
        ],
    )
    .await
}
