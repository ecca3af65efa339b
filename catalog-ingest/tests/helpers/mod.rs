//! Test helpers: an in-process data host and client/database builders

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use catalog_common::Database;
use catalog_ingest::services::SourceClient;
use catalog_ingest::utils::RetryPolicy;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const MANIFEST: &str = "files_list.data";

#[derive(Default)]
struct HostState {
    files: HashMap<String, (StatusCode, String)>,
    /// Remaining 503 answers per file before the real one is served
    outages: HashMap<String, usize>,
    hits: HashMap<String, usize>,
}

type SharedState = Arc<Mutex<HostState>>;

/// Serves `/{name}` from an in-memory map; unknown names are 404
pub struct MockHost {
    pub addr: SocketAddr,
    state: SharedState,
}

impl MockHost {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener, HostState::default())
    }

    /// Bind a specific address with the manifest already published
    pub async fn start_on_with_manifest(addr: SocketAddr, links: &[&str]) -> Self {
        let mut state = HostState::default();
        state
            .files
            .insert(MANIFEST.to_string(), (StatusCode::OK, links.join("\n")));
        let listener = TcpListener::bind(addr).await.unwrap();
        Self::serve(listener, state)
    }

    fn serve(listener: TcpListener, state: HostState) -> Self {
        let addr = listener.local_addr().unwrap();
        let state: SharedState = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/:name", get(serve_file))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn set_manifest(&self, links: &[&str]) {
        self.set_file(MANIFEST, &links.join("\n"));
    }

    pub fn set_file(&self, name: &str, body: &str) {
        self.set_response(name, StatusCode::OK, body);
    }

    pub fn set_response(&self, name: &str, status: StatusCode, body: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(name.to_string(), (status, body.to_string()));
    }

    /// Answer the next `count` requests for `name` with 503
    pub fn fail_next(&self, name: &str, count: usize) {
        self.state
            .lock()
            .unwrap()
            .outages
            .insert(name.to_string(), count);
    }

    pub fn hits(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

async fn serve_file(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> (StatusCode, String) {
    let mut state = state.lock().unwrap();
    *state.hits.entry(name.clone()).or_insert(0) += 1;

    if let Some(remaining) = state.outages.get_mut(&name) {
        if *remaining > 0 {
            *remaining -= 1;
            return (StatusCode::SERVICE_UNAVAILABLE, "try later".to_string());
        }
    }

    match state.files.get(&name) {
        Some((status, body)) => (*status, body.clone()),
        None => (StatusCode::NOT_FOUND, "not found".to_string()),
    }
}

/// Short waits so retry paths finish quickly
pub fn fast_retry(max_attempts: Option<u32>) -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(5),
        max_jitter: Duration::from_millis(1),
        max_attempts,
    }
}

pub fn client_for(base_url: &str, retry: RetryPolicy) -> SourceClient {
    SourceClient::new(base_url, MANIFEST, retry, Duration::from_secs(5)).unwrap()
}

pub async fn memory_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

pub async fn count_rows(db: &Database, table: &str) -> usize {
    db.read(&["id"], table, None).await.unwrap().len()
}

/// A port nothing is listening on (bound, then released)
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn song_json(artist: &str, title: &str, year: i64, release: &str) -> String {
    format!(
        r#"{{"type": "song", "data": {{"artist_name": "{}", "title": "{}", "year": {}, "release": "{}"}}}}"#,
        artist, title, year, release
    )
}

pub fn movie_json(title: &str) -> String {
    format!(
        r#"{{"type": "movie", "data": {{"original_title": "{}", "original_language": "en", "budget": 175000000, "is_adult": false, "release_date": "2017-07-05"}}}}"#,
        title
    )
}

pub fn app_json(name: &str) -> String {
    format!(
        r#"{{"type": "app", "data": {{"name": "{}", "genre": "Productivity", "rating": 4.5, "version": "1.2.0", "size_bytes": 52428800}}}}"#,
        name
    )
}

pub fn payload(records: &[String]) -> String {
    format!("[{}]", records.join(","))
}
