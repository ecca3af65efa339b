//! catalog-ingest library interface
//!
//! One ingestion pass: fetch the remote manifest, work out which data links
//! have not been ingested yet, then download, classify and store each of
//! them in manifest order.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::error::{FetchError, IngestError, IngestResult};
pub use crate::workflow::{Ingestor, RunSummary};
