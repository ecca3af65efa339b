//! Bootstrap configuration loading and resolution
//!
//! Settings come from four tiers, highest priority first:
//! 1. Command-line arguments (passed in as [`ConfigOverrides`])
//! 2. Environment variables (`CATALOG_CONFIG`, `CATALOG_BASE_URL`, `CATALOG_DATABASE_PATH`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: the resolver logs a warning and
//! continues with defaults. A file that exists but does not parse is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Remote host serving the manifest and data files
pub const DEFAULT_BASE_URL: &str = "https://data-engineering-interns.macpaw.io/";

/// Manifest resource name, relative to the base URL
pub const DEFAULT_MANIFEST_RESOURCE: &str = "files_list.data";

pub const ENV_CONFIG_PATH: &str = "CATALOG_CONFIG";
pub const ENV_BASE_URL: &str = "CATALOG_BASE_URL";
pub const ENV_DATABASE_PATH: &str = "CATALOG_DATABASE_PATH";

const APP_DIR: &str = "catalog-ingest";

/// Configuration file contents
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Base URL prepended to the manifest resource and every data link
    pub base_url: String,

    /// Path to the SQLite database file
    ///
    /// If not specified, falls back to the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Manifest resource name (default: `files_list.data`)
    pub manifest_resource: String,

    pub retry: RetryConfig,

    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database_path: None,
            manifest_resource: DEFAULT_MANIFEST_RESOURCE.to_string(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Backoff settings for remote fetches
///
/// Wait before retry `n` (0-based) is `base_delay_ms * 2^n` plus up to
/// `max_jitter_ms` of random jitter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
    /// Maximum number of retries after the first attempt. 0 means unbounded.
    pub max_attempts: u32,
    pub request_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_jitter_ms: 10,
            max_attempts: 10,
            request_timeout_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    /// Retry bound, `None` when unbounded
    pub fn max_attempts(&self) -> Option<u32> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub database_path: Option<PathBuf>,
}

/// Fully resolved configuration handed to the ingestion pipeline
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub manifest_resource: String,
    pub database_path: PathBuf,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Applies the CLI → ENV → TOML → default priority order
pub struct ConfigResolver {
    overrides: ConfigOverrides,
}

impl ConfigResolver {
    pub fn new(overrides: ConfigOverrides) -> Self {
        Self { overrides }
    }

    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let toml_config = self.load_toml()?;

        let base_url = self
            .overrides
            .base_url
            .clone()
            .or_else(|| non_empty_env(ENV_BASE_URL))
            .unwrap_or(toml_config.base_url);
        let base_url = normalize_base_url(&base_url)?;

        let database_path = self
            .overrides
            .database_path
            .clone()
            .or_else(|| non_empty_env(ENV_DATABASE_PATH).map(PathBuf::from))
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        if toml_config.retry.max_jitter_ms >= toml_config.retry.base_delay_ms {
            warn!(
                base_delay_ms = toml_config.retry.base_delay_ms,
                max_jitter_ms = toml_config.retry.max_jitter_ms,
                "Retry jitter is not smaller than base delay; backoff waits may not grow monotonically"
            );
        }

        Ok(ResolvedConfig {
            base_url,
            manifest_resource: toml_config.manifest_resource,
            database_path,
            retry: toml_config.retry,
            logging: toml_config.logging,
        })
    }

    /// An explicitly named file must exist; the default locations may be absent.
    fn load_toml(&self) -> Result<TomlConfig> {
        let explicit = self
            .overrides
            .config_path
            .clone()
            .or_else(|| non_empty_env(ENV_CONFIG_PATH).map(PathBuf::from));

        if let Some(path) = explicit {
            info!("Loading configuration from {}", path.display());
            return TomlConfig::load(&path);
        }

        match default_config_candidates().into_iter().find(|p| p.exists()) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)
            }
            None => {
                warn!("No configuration file found, using built-in defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// Ensure the base URL is an http(s) URL ending in `/`
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "base_url must start with http:// or https://, got '{}'",
            raw
        )));
    }
    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}/", trimmed))
    }
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join("catalog.db"))
        .unwrap_or_else(|| PathBuf::from("./catalog_data/catalog.db"))
}

/// Config file locations searched when none is given explicitly
fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(APP_DIR).join("config.toml"));
    }
    if cfg!(unix) {
        candidates.push(PathBuf::from("/etc").join(APP_DIR).join("config.toml"));
    }
    candidates
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.manifest_resource, "files_list.data");
        assert!(config.database_path.is_none());
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.retry.max_attempts(), Some(10));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_retry_section() {
        let config = TomlConfig::from_toml_str(
            r#"
            [retry]
            max_attempts = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts(), None);
        assert_eq!(config.retry.max_jitter(), Duration::from_millis(10));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("base_url = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8080").unwrap(),
            "http://localhost:8080/"
        );
        assert_eq!(
            normalize_base_url(" https://example.org/data/ ").unwrap(),
            "https://example.org/data/"
        );
        assert!(normalize_base_url("ftp://example.org/").is_err());
    }
}
