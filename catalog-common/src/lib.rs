//! # Catalog Common Library
//!
//! Shared code for the catalog ingestion tools:
//! - Error type used across crates
//! - Bootstrap configuration loading and resolution
//! - Database bootstrap and generic read/write primitives

pub mod config;
pub mod db;
pub mod error;

pub use db::{Database, SqlValue};
pub use error::{Error, Result};
