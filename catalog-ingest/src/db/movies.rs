//! Movie persistence

use crate::models::Movie;
use crate::services::classifier::normalize_title;
use catalog_common::db::{insert_row, MOVIES_TABLE};
use catalog_common::Result;
use sqlx::SqliteConnection;

pub const MOVIE_COLUMNS: [&str; 6] = [
    "original_title",
    "original_language",
    "budget",
    "is_adult",
    "release_date",
    "original_title_normalized",
];

/// Insert a movie together with its normalized title
///
/// A NULL title gives a NULL normalized title.
pub async fn insert_movie(conn: &mut SqliteConnection, movie: &Movie) -> Result<()> {
    insert_row(
        conn,
        MOVIES_TABLE,
        &MOVIE_COLUMNS,
        vec![
            movie.original_title.as_deref().into(),
            movie.original_language.as_deref().into(),
            movie.budget.into(),
            movie.is_adult.into(),
            movie
                .release_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .into(),
            movie.original_title.as_deref().map(normalize_title).into(),
        ],
    )
    .await
}
