//! Ingestion orchestrator
//!
//! **Sequence per run:**
//! 1. Fetch manifest
//! 2. Compute delta against the ledger
//! 3. For each new link, in manifest order: fetch payload, classify, persist
//!
//! Each link is written in a single transaction (songs, movies, apps, then
//! the ledger entry), so a failure leaves no partial rows and the link is
//! picked up again on the next run.

use crate::db::{apps, movies, processed, songs};
use crate::error::{IngestError, IngestResult};
use crate::models::Classified;
use crate::services::awesome_flag::{resolve_is_awesome, AwesomeFlag, RandomAwesome};
use crate::services::classifier::classify;
use crate::services::reconciler::compute_delta;
use crate::services::source_client::SourceClient;
use catalog_common::Database;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Rows written for one link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredCounts {
    pub songs: usize,
    pub movies: usize,
    pub apps: usize,
}

/// Outcome of persisting one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Stored(StoredCounts),
    /// The ledger already had the link (a duplicate within the manifest)
    AlreadyProcessed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub link: String,
    pub reason: String,
}

/// Result of one ingestion pass
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub manifest_len: usize,
    pub new_links: usize,
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<SourceFailure>,
    pub rows: StoredCounts,
}

impl RunSummary {
    fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            manifest_len: 0,
            new_links: 0,
            processed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            rows: StoredCounts::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs ingestion passes against one database and one remote host
pub struct Ingestor {
    db: Database,
    client: SourceClient,
    awesome: Box<dyn AwesomeFlag>,
}

impl Ingestor {
    pub fn new(db: Database, client: SourceClient) -> Self {
        Self {
            db,
            client,
            awesome: Box::new(RandomAwesome),
        }
    }

    /// Replace the coin flip used for apps without an `is_awesome` value
    pub fn with_awesome_flag(mut self, flag: impl AwesomeFlag + 'static) -> Self {
        self.awesome = Box::new(flag);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn close(self) {
        self.db.close().await;
    }

    /// One full pass over the manifest
    ///
    /// Manifest and store failures abort the pass. A link whose payload
    /// cannot be fetched or decoded is recorded in `failed` and skipped.
    pub async fn run(&mut self) -> IngestResult<RunSummary> {
        let mut summary = RunSummary::start(Utc::now());

        let manifest = self.client.fetch_manifest().await?;
        summary.manifest_len = manifest.len();

        let delta = compute_delta(&self.db, &manifest).await?;
        summary.new_links = delta.len();

        for link in delta {
            match self.ingest_source(&link).await {
                Ok(SourceOutcome::Stored(counts)) => {
                    summary.rows.songs += counts.songs;
                    summary.rows.movies += counts.movies;
                    summary.rows.apps += counts.apps;
                    summary.processed.push(link);
                }
                Ok(SourceOutcome::AlreadyProcessed) => {
                    summary.skipped.push(link);
                }
                Err(err) if err.is_source_local() => {
                    error!(link = %link, error = %err, "Failed to ingest source, skipping");
                    summary.failed.push(SourceFailure {
                        link,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        summary.finished_at = Utc::now();
        info!(
            manifest = summary.manifest_len,
            new = summary.new_links,
            processed = summary.processed.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            songs = summary.rows.songs,
            movies = summary.rows.movies,
            apps = summary.rows.apps,
            elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
            "Ingestion run finished"
        );

        Ok(summary)
    }

    /// Fetch, classify and persist one link
    pub async fn ingest_source(&mut self, link: &str) -> IngestResult<SourceOutcome> {
        let records = self.client.fetch_payload(link).await?;
        let classified = classify(records)?;
        self.persist(&classified, link).await
    }

    /// Write all records of one link plus its ledger entry atomically
    pub async fn persist(
        &mut self,
        classified: &Classified,
        link: &str,
    ) -> IngestResult<SourceOutcome> {
        info!("Processing {}", link);

        let mut tx = self.db.begin().await?;

        if processed::is_processed(&mut tx, link).await? {
            warn!(link = %link, "Link already in ledger, skipping");
            return Ok(SourceOutcome::AlreadyProcessed);
        }

        for song in &classified.songs {
            songs::insert_song(&mut tx, song).await?;
        }
        for movie in &classified.movies {
            movies::insert_movie(&mut tx, movie).await?;
        }
        for app in &classified.apps {
            let is_awesome = resolve_is_awesome(app, self.awesome.as_mut());
            apps::insert_app(&mut tx, app, is_awesome).await?;
        }
        processed::mark_processed(&mut tx, link).await?;

        tx.commit().await.map_err(IngestError::from)?;

        let counts = StoredCounts {
            songs: classified.songs.len(),
            movies: classified.movies.len(),
            apps: classified.apps.len(),
        };
        debug!(link = %link, ?counts, "Committed source");
        info!("Successfully processed and stored {}", link);

        Ok(SourceOutcome::Stored(counts))
    }
}
