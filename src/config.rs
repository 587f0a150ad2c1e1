//! Configuration management for the CRPT client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{CrptError, Result};
use crate::ratelimit::{SlidingWindowLimiter, TimeUnit, WindowConfig};

/// Main configuration for the CRPT client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrptConfig {
    /// Document API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// Document API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Document creation endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token; the Authorization header is omitted when unset
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_endpoint() -> String {
    "https://ismp.crpt.ru/api/v3/lk/documents/create".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Window size; the window spans exactly one unit
    #[serde(default = "default_unit")]
    pub unit: TimeUnit,

    /// Maximum requests per window, must be positive
    #[serde(default = "default_requests_per_unit")]
    pub requests_per_unit: i64,

    /// Maximum time a caller waits for a permit; unset means wait indefinitely
    #[serde(default)]
    pub max_wait_ms: Option<u64>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            requests_per_unit: default_requests_per_unit(),
            max_wait_ms: None,
        }
    }
}

fn default_unit() -> TimeUnit {
    TimeUnit::Second
}

fn default_requests_per_unit() -> i64 {
    10
}

impl RateLimitSettings {
    /// Validate the settings and build a limiter from them.
    pub fn build_limiter(&self) -> Result<SlidingWindowLimiter> {
        let window = WindowConfig::new(self.unit, self.requests_per_unit)?;
        let limiter = SlidingWindowLimiter::from_config(window);

        Ok(match self.max_wait_ms {
            Some(ms) => limiter.with_max_wait(Duration::from_millis(ms)),
            None => limiter,
        })
    }
}

impl CrptConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| CrptError::Config(format!("Failed to parse configuration: {}", e)))
    }
}
