//! Catalog table writes
//!
//! Insert functions take a `SqliteConnection` so the orchestrator can run a
//! whole data file inside one transaction.

pub mod apps;
pub mod movies;
pub mod processed;
pub mod songs;
