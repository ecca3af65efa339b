pub mod orchestrator;

pub use orchestrator::{Ingestor, RunSummary, SourceFailure, SourceOutcome, StoredCounts};
