//! Record classification and title normalization

use crate::error::{IngestError, IngestResult};
use crate::models::{Classified, RecordKind, TaggedRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static NON_ALPHANUMERIC_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^0-9A-Za-z]+").expect("static regex is valid"));

/// Partition records into songs, movies and apps
///
/// Records of any other type are dropped. Relative order inside each bucket
/// follows the input. A known type whose `data` is not an object, lacks an
/// attribute key or holds a value its column cannot take fails the whole
/// payload.
pub fn classify(records: Vec<TaggedRecord>) -> IngestResult<Classified> {
    let mut classified = Classified::default();
    let mut dropped = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        let Some(kind) = RecordKind::from_tag(&record.kind) else {
            tracing::debug!(index, kind = %record.kind, "Dropping record of unknown type");
            dropped += 1;
            continue;
        };

        match kind {
            RecordKind::Song => classified.songs.push(decode(kind, index, record.data)?),
            RecordKind::Movie => classified.movies.push(decode(kind, index, record.data)?),
            RecordKind::App => classified.apps.push(decode(kind, index, record.data)?),
        }
    }

    tracing::debug!(
        songs = classified.songs.len(),
        movies = classified.movies.len(),
        apps = classified.apps.len(),
        dropped,
        "Classified payload"
    );

    Ok(classified)
}

fn decode<T: DeserializeOwned>(
    kind: RecordKind,
    index: usize,
    data: serde_json::Value,
) -> IngestResult<T> {
    serde_json::from_value(data).map_err(|e| IngestError::InvalidRecord {
        kind: kind.as_str().to_string(),
        index,
        reason: e.to_string(),
    })
}

/// Lowercase a title, collapsing each run of non-`[0-9A-Za-z]` characters into `_`
///
/// "Spider-Man: Homecoming!" becomes "spider_man_homecoming_". Leading and
/// trailing runs are kept as a single underscore.
pub fn normalize_title(title: &str) -> String {
    NON_ALPHANUMERIC_RUN
        .replace_all(title, "_")
        .to_ascii_lowercase()
}
