//! Song persistence

use crate::models::Song;
use catalog_common::db::{insert_row, SONGS_TABLE};
use catalog_common::Result;
use sqlx::SqliteConnection;

pub const SONG_COLUMNS: [&str; 4] = ["artist_name", "title", "year", "release"];

/// Insert a song; `ingestion_time` is filled by the column default
pub async fn insert_song(conn: &mut SqliteConnection, song: &Song) -> Result<()> {
    insert_row(
        conn,
        SONGS_TABLE,
        &SONG_COLUMNS,
        vec![
            song.artist_name.as_deref().into(),
            song.title.as_deref().into(),
            song.year.into(),
            song.release.as_deref().into(),
        ],
    )
    .await
}
