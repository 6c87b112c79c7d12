//! Configuration management system for albumsync
//!
//! Configuration is layered: built-in defaults, then an optional YAML/TOML/JSON
//! file, then environment variables prefixed with `ALBUMSYNC` (nested keys are
//! separated by `__`, e.g. `ALBUMSYNC__CREDENTIALS__API_KEY`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use albumsync_config::{Config, ConfigBuilder};
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("albumsync.yaml")
//!     .add_env_prefix("ALBUMSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Concurrency: {}", config.sync.concurrency);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use albumsync_types::{Concurrency, RetryConfig, TimeoutConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Environment variable prefix used by the default loaders
pub const ENV_PREFIX: &str = "ALBUMSYNC";

/// Main configuration structure for albumsync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default API credentials
    #[serde(default)]
    pub credentials: Credentials,
    /// Named credential profiles, selected with `--config-profile`
    #[serde(default)]
    pub profiles: BTreeMap<String, Credentials>,
    /// Sync behaviour defaults
    #[serde(default)]
    pub sync: SyncSettings,
    /// Remote API settings
    #[serde(default)]
    pub network: NetworkSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Credentials of the named profile, or the top-level ones when no profile is given
    pub fn credentials_for(&self, profile: Option<&str>) -> ConfigResult<&Credentials> {
        match profile {
            None => Ok(&self.credentials),
            Some(name) => self
                .profiles
                .get(name)
                .ok_or_else(|| ConfigError::missing_required(format!("profiles.{}", name))),
        }
    }
}

/// API key, secret and a pre-issued OAuth access token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// API key
    #[serde(default)]
    pub api_key: String,
    /// API secret
    #[serde(default)]
    pub api_secret: String,
    /// OAuth access token
    #[serde(default)]
    pub oauth_token: String,
    /// OAuth access token secret
    #[serde(default)]
    pub oauth_token_secret: String,
}

impl Credentials {
    /// Require the API key and secret
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::missing_required("api_key"));
        }
        if self.api_secret.trim().is_empty() {
            return Err(ConfigError::missing_required("api_secret"));
        }
        Ok(())
    }

    /// Whether an OAuth access token is present
    pub fn has_token(&self) -> bool {
        !self.oauth_token.is_empty() && !self.oauth_token_secret.is_empty()
    }
}

/// Sync behaviour defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Tag applied to uploads and used to filter the remote listing
    #[serde(default)]
    pub tag: Option<String>,
    /// Transfers kept in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Narrate without mutating anything
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncSettings {
    /// Validated concurrency limit
    pub fn concurrency(&self) -> ConfigResult<Concurrency> {
        Concurrency::new(self.concurrency)
            .map_err(|message| ConfigError::invalid_value("sync.concurrency".to_string(), message))
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            tag: None,
            concurrency: default_concurrency(),
            dry_run: false,
        }
    }
}

fn default_concurrency() -> usize {
    Concurrency::MIN
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// REST endpoint
    pub api_base_url: String,
    /// Upload endpoint
    pub upload_url: String,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Retries after a transient failure
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub retry_initial_delay_ms: u64,
    /// Upper bound on the retry delay, in milliseconds
    pub retry_max_delay_ms: u64,
    /// Backoff multiplier between retries
    pub retry_backoff_multiplier: f64,
}

impl NetworkSettings {
    /// Timeouts as a typed value
    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Retry policy as a validated value
    pub fn retry(&self) -> ConfigResult<RetryConfig> {
        RetryConfig::new(
            self.max_retries,
            Duration::from_millis(self.retry_initial_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
            self.retry_backoff_multiplier,
        )
        .map_err(|message| ConfigError::invalid_value("network.retry".to_string(), message))
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        let retry = RetryConfig::default();
        let timeouts = TimeoutConfig::default();
        Self {
            api_base_url: "https://api.flickr.com/services/rest".to_string(),
            upload_url: "https://up.flickr.com/services/upload/".to_string(),
            connect_timeout_secs: timeouts.connect_timeout.as_secs(),
            request_timeout_secs: timeouts.request_timeout.as_secs(),
            max_retries: retry.max_retries,
            retry_initial_delay_ms: retry.initial_delay.as_millis() as u64,
            retry_max_delay_ms: retry.max_delay.as_millis() as u64,
            retry_backoff_multiplier: retry.backoff_multiplier,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path, `stderr` when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Enable JSON formatting
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
            json_format: false,
        }
    }
}

/// Accepted values for `logging.level`
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
