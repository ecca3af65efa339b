//! Payload record types
//!
//! A data file is a JSON array of tagged records:
//! `{ "type": "song" | "movie" | "app", "data": { ... } }`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a data file, before classification
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaggedRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl TaggedRecord {
    pub fn new(kind: &str, data: Value) -> Self {
        Self {
            kind: kind.to_string(),
            data,
        }
    }
}

/// Record types with a destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Song,
    Movie,
    App,
}

impl RecordKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "song" => Some(RecordKind::Song),
            "movie" => Some(RecordKind::Movie),
            "app" => Some(RecordKind::App),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Song => "song",
            RecordKind::Movie => "movie",
            RecordKind::App => "app",
        }
    }
}

// Every attribute key must be present in `data`. A `null` value is kept as
// `None` and stored as NULL. Other JSON types are coerced the way the column
// would accept them on insert; anything else is an invalid record.

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Song {
    #[serde(deserialize_with = "attr::required")]
    pub artist_name: Option<String>,
    #[serde(deserialize_with = "attr::required")]
    pub title: Option<String>,
    #[serde(deserialize_with = "attr::required")]
    pub year: Option<i64>,
    #[serde(deserialize_with = "attr::required")]
    pub release: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Movie {
    #[serde(deserialize_with = "attr::required")]
    pub original_title: Option<String>,
    #[serde(deserialize_with = "attr::required")]
    pub original_language: Option<String>,
    #[serde(deserialize_with = "attr::required")]
    pub budget: Option<i64>,
    #[serde(deserialize_with = "attr::required")]
    pub is_adult: Option<bool>,
    /// Calendar date; stored as ISO `YYYY-MM-DD` text
    #[serde(deserialize_with = "attr::required")]
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct App {
    #[serde(deserialize_with = "attr::required")]
    pub name: Option<String>,
    #[serde(deserialize_with = "attr::required")]
    pub genre: Option<String>,
    #[serde(deserialize_with = "attr::required")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "attr::required")]
    pub version: Option<String>,
    #[serde(deserialize_with = "attr::required")]
    pub size_bytes: Option<i64>,
    /// Only present when the source supplies it
    #[serde(default, deserialize_with = "attr::required")]
    pub is_awesome: Option<bool>,
}

/// Records of one data file, bucketed by type in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub songs: Vec<Song>,
    pub movies: Vec<Movie>,
    pub apps: Vec<App>,
}

impl Classified {
    pub fn len(&self) -> usize {
        self.songs.len() + self.movies.len() + self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Field decoding for record attributes
mod attr {
    use chrono::NaiveDate;
    use serde::de::{Deserialize, Deserializer, Error};
    use serde_json::Value;

    /// A scalar column type and the JSON values it accepts
    pub trait Coerce: Sized {
        const EXPECTED: &'static str;
        fn coerce(value: &Value) -> Option<Self>;
    }

    impl Coerce for String {
        const EXPECTED: &'static str = "text";

        fn coerce(value: &Value) -> Option<Self> {
            match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            }
        }
    }

    impl Coerce for i64 {
        const EXPECTED: &'static str = "an integer";

        fn coerce(value: &Value) -> Option<Self> {
            match value {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        }
    }

    impl Coerce for f64 {
        const EXPECTED: &'static str = "a number";

        fn coerce(value: &Value) -> Option<Self> {
            match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        }
    }

    impl Coerce for bool {
        const EXPECTED: &'static str = "a boolean";

        fn coerce(value: &Value) -> Option<Self> {
            match value {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(false),
                    Some(1) => Some(true),
                    _ => None,
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
                    "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
                    _ => None,
                },
                _ => None,
            }
        }
    }

    impl Coerce for NaiveDate {
        const EXPECTED: &'static str = "a YYYY-MM-DD date";

        fn coerce(value: &Value) -> Option<Self> {
            match value {
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        }
    }

    /// Decode a key that must be present; `null` becomes `None`
    ///
    /// Using `deserialize_with` makes a missing key a `missing field` error
    /// unless the field also carries `#[serde(default)]`.
    pub fn required<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Coerce,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(None);
        }
        T::coerce(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected {}, got {}", T::EXPECTED, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_attribute_is_none() {
        let song: Song = serde_json::from_value(
            json!({"artist_name": "X", "title": "Y", "year": null, "release": "Z"}),
        )
        .unwrap();
        assert_eq!(song.year, None);
        assert_eq!(song.title.as_deref(), Some("Y"));
    }

    #[test]
    fn test_missing_attribute_is_error() {
        let err = serde_json::from_value::<Song>(json!({"artist_name": "X", "title": "Y", "release": "Z"}))
            .unwrap_err();
        assert!(err.to_string().contains("missing field `year`"));
    }

    #[test]
    fn test_scalar_attributes_are_coerced() {
        let movie: Movie = serde_json::from_value(json!({
            "original_title": 1917,
            "original_language": "en",
            "budget": "95000000",
            "is_adult": 0,
            "release_date": "2019-12-25"
        }))
        .unwrap();
        assert_eq!(movie.original_title.as_deref(), Some("1917"));
        assert_eq!(movie.budget, Some(95_000_000));
        assert_eq!(movie.is_adult, Some(false));
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2019, 12, 25));
    }

    #[test]
    fn test_uncoercible_attribute_is_error() {
        let err = serde_json::from_value::<Movie>(json!({
            "original_title": "Dunkirk",
            "original_language": "en",
            "budget": 100000000,
            "is_adult": false,
            "release_date": "2017"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));

        let err = serde_json::from_value::<App>(json!({
            "name": "Clock",
            "genre": "Utilities",
            "rating": {"stars": 3},
            "version": "2",
            "size_bytes": 1024
        }))
        .unwrap_err();
        assert!(err.to_string().contains("a number"));
    }

    #[test]
    fn test_app_is_awesome_may_be_absent() {
        let app: App = serde_json::from_value(json!({
            "name": "Clock",
            "genre": "Utilities",
            "rating": 3.0,
            "version": "2",
            "size_bytes": 1024
        }))
        .unwrap();
        assert_eq!(app.is_awesome, None);
        assert_eq!(app.rating, Some(3.0));
    }
}
