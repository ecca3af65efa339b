//! Remote source client
//!
//! Two GET requests against a fixed base URL:
//! - `{base_url}{manifest_resource}`: newline separated list of data links
//! - `{base_url}{link}`: JSON array of tagged records
//!
//! Both retry transient failures with exponential backoff.

use crate::error::FetchError;
use crate::models::TaggedRecord;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};
use catalog_common::config::ResolvedConfig;
use std::time::Duration;

const USER_AGENT: &str = concat!("catalog-ingest/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the manifest host
pub struct SourceClient {
    http_client: reqwest::Client,
    base_url: String,
    manifest_resource: String,
    retry: RetryPolicy,
}

impl SourceClient {
    /// `base_url` is used verbatim as a prefix, so it should end with `/`
    pub fn new(
        base_url: &str,
        manifest_resource: &str,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.to_string(),
            manifest_resource: manifest_resource.to_string(),
            retry,
        })
    }

    pub fn from_config(config: &ResolvedConfig) -> Result<Self, FetchError> {
        Self::new(
            &config.base_url,
            &config.manifest_resource,
            RetryPolicy::from_config(&config.retry),
            config.retry.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, resource: &str) -> String {
        format!("{}{}", self.base_url, resource)
    }

    /// Fetch the list of data links in server order
    pub async fn fetch_manifest(&self) -> Result<Vec<String>, FetchError> {
        let url = self.url_for(&self.manifest_resource);
        let url = url.as_str();

        tracing::debug!(url = %url, "Fetching manifest");

        let body = retry_with_backoff("manifest fetch", &self.retry, move || self.get_text(url)).await?;
        let links = parse_manifest(&body);

        tracing::info!(count = links.len(), "Manifest fetched");
        Ok(links)
    }

    /// Fetch and decode one data file
    ///
    /// A body that does not decode is retried like a connection failure,
    /// within the same retry bound.
    pub async fn fetch_payload(&self, link: &str) -> Result<Vec<TaggedRecord>, FetchError> {
        let url = self.url_for(link);
        let url = url.as_str();

        tracing::debug!(link = %link, url = %url, "Fetching payload");

        retry_with_backoff("payload fetch", &self.retry, move || async move {
            let body = self.get_text(url).await?;
            parse_payload(&body, url)
        })
        .await
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| from_reqwest(url, e))
    }
}

/// Split a manifest body into links, dropping blank lines
///
/// Only the line terminator is removed; other whitespace is part of the link.
pub fn parse_manifest(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_payload(body: &str, url: &str) -> Result<Vec<TaggedRecord>, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn from_reqwest(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_connect() || err.is_timeout() || err.is_body() {
        FetchError::Connect {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
