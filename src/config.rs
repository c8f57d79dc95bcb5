//! Client configuration

use serde::Deserialize;

use crate::error::{Error, Result};

/// Connection settings for the Toon cloud API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Base URL of the live update stream. Derived from `base_url`
    /// (`https` becomes `wss`) when unset.
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Maximum time to wait for a single request to complete, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retries for transient request failures (network errors, 429, 5xx).
    #[serde(default = "default_request_retries")]
    pub request_retries: u32,
    /// Initial delay between request retries, in milliseconds. Doubles on
    /// each consecutive failure.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Overrides the default `User-Agent` header.
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub listen: ListenConfig,
}

/// Reconnect behavior of the live update channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Consecutive failed connection attempts before the listener gives up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnect attempt, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for the exponential reconnect backoff, in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            request_retries: default_request_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: None,
            listen: ListenConfig::default(),
        }
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: default_max_reconnect_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.toon.eu".to_string()
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_request_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl ApiConfig {
    /// Load configuration from an optional `toonapi` file and
    /// `TOONAPI`-prefixed environment variables (e.g. `TOONAPI_BASE_URL`,
    /// `TOONAPI_LISTEN__MAX_RECONNECT_ATTEMPTS`).
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("toonapi").required(false))
            .add_source(config::Environment::with_prefix("TOONAPI").separator("__"))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let config = settings
            .try_deserialize()
            .unwrap_or_else(|_| ApiConfig::default());

        Ok(config)
    }
}
