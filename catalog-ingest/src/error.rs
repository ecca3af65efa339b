//! Error types for catalog-ingest
//!
//! Fetch failures are split into retryable (connection, malformed payload,
//! 5xx) and fatal. Per-source failures are kept apart from store failures so
//! the orchestrator can skip a bad source but abort on a broken database.

use thiserror::Error;

/// Remote source client errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Could not connect, timed out, or the body could not be read
    #[error("Connection error for {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Body is not the expected JSON shape
    #[error("Malformed payload from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request error for {url}: {reason}")]
    Request { url: String, reason: String },

    #[error("{operation} gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        last_error: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Connect { .. } | FetchError::Decode { .. } => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::Request { .. } | FetchError::RetriesExhausted { .. } => false,
        }
    }
}

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] catalog_common::Error),

    /// A record of a known type whose data does not match that type
    #[error("Invalid {kind} record at index {index}: {reason}")]
    InvalidRecord {
        kind: String,
        index: usize,
        reason: String,
    },
}

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        IngestError::Store(catalog_common::Error::Database(err))
    }
}

impl IngestError {
    /// Failures confined to one source; the run may continue past them
    pub fn is_source_local(&self) -> bool {
        !matches!(self, IngestError::Store(_))
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
