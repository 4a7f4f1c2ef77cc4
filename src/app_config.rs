use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::persistence::{FileStorage, DEFAULT_SNAPSHOT_KEY, DEFAULT_SNAPSHOT_TTL};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Remote translation endpoint
    #[serde(default)]
    pub api: ApiConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Remote step endpoint settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    // @field: Base URL of the translation REST namespace
    #[serde(default = "default_base_url")]
    pub base_url: String,

    // @field: Path of the chunked step endpoint, relative to base_url
    #[serde(default = "default_step_path")]
    pub step_path: String,

    // @field: Header carrying the anti-forgery token
    #[serde(default = "default_token_header")]
    pub token_header: String,

    // @field: Anti-forgery token, sent only when non-empty
    #[serde(default)]
    pub token: String,

    // @field: Timeout seconds per step request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            step_path: default_step_path(),
            token_header: default_token_header(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where and for how long the queue snapshot is kept
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PersistenceConfig {
    // @field: Snapshot directory, None for the user's data directory
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    // @field: Storage key of the snapshot
    #[serde(default = "default_snapshot_key")]
    pub key: String,

    // @field: Snapshot time-to-live in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            key: default_snapshot_key(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl PersistenceConfig {
    /// Configured directory, or the default data directory
    pub fn resolve_storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => FileStorage::default_storage_dir(),
        }
    }

    /// Snapshot time-to-live
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/wp-json/translate/v1".to_string()
}

fn default_step_path() -> String {
    "translate/chunked".to_string()
}

fn default_token_header() -> String {
    "X-WP-Nonce".to_string()
}

fn default_timeout_secs() -> u64 {
    120 // Finalize can take a while on large documents
}

fn default_snapshot_key() -> String {
    DEFAULT_SNAPSHOT_KEY.to_string()
}

fn default_ttl_secs() -> u64 {
    DEFAULT_SNAPSHOT_TTL.as_secs()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.api.base_url)
            .map_err(|e| anyhow!("Invalid api.base_url '{}': {}", self.api.base_url, e))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("api.base_url must be an absolute http(s) URL"));
        }

        if self.api.step_path.trim_matches('/').is_empty() {
            return Err(anyhow!("api.step_path must not be empty"));
        }

        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be positive"));
        }

        if self.persistence.key.trim().is_empty() {
            return Err(anyhow!("persistence.key must not be empty"));
        }

        if self.persistence.ttl_secs == 0 {
            return Err(anyhow!("persistence.ttl_secs must be positive"));
        }

        Ok(())
    }

    /// Load the configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
