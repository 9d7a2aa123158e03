//! Configuration loading for chatsync clients.
//!
//! Configuration is loaded from a TOML file. Every field has a default, so an
//! empty file (or no file at all) yields a working setup pointed at a local
//! store.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chat_core::PollPolicy;
use chat_types::UserId;

use crate::client::ChatConfig;
use crate::store::{HttpStore, HttpStoreError};

/// Root configuration for a chatsync client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Remote store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Poll timing configuration.
    #[serde(default)]
    pub poll: PollConfig,
    /// Local user configuration.
    #[serde(default)]
    pub user: UserConfig,
}

/// Remote store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Messages endpoint (default: http://127.0.0.1:8000/messages).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chat seeding endpoint (optional).
    #[serde(default)]
    pub init_url: Option<String>,
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Poll timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Tick period in milliseconds (default: 3000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Back off after failed ticks (default: false).
    #[serde(default)]
    pub backoff: bool,
    /// Longest gap between ticks when backing off, in milliseconds (default: 60000).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

/// Local user configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    /// Local user id (default: 1).
    #[serde(default = "default_user_id")]
    pub id: i64,
}

// Default value functions
fn default_base_url() -> String {
    "http://127.0.0.1:8000/messages".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_interval_ms() -> u64 {
    3000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_user_id() -> i64 {
    1
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            init_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            backoff: false,
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Set the local user.
    pub fn with_user(mut self, id: i64) -> Self {
        self.user.id = id;
        self
    }

    /// Set the poll period.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.poll.interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the store endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.store.base_url = base_url.to_string();
        self
    }

    /// The poll policy described by `[poll]`.
    pub fn poll_policy(&self) -> PollPolicy {
        let policy = PollPolicy::fixed(Duration::from_millis(self.poll.interval_ms));
        if self.poll.backoff {
            policy.with_backoff(Duration::from_millis(self.poll.max_backoff_ms))
        } else {
            policy
        }
    }

    /// Client settings for [`ChatClient`](crate::ChatClient).
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            user: UserId::new(self.user.id),
            poll: self.poll_policy(),
        }
    }

    /// Build the HTTP store described by `[store]`.
    pub fn http_store(&self) -> Result<HttpStore, HttpStoreError> {
        HttpStore::new(
            &self.store.base_url,
            self.store.init_url.as_deref(),
            Duration::from_secs(self.store.request_timeout_secs),
        )
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
