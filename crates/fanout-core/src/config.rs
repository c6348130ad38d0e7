use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::executor::ExecutorConfig;
use crate::retry::ExponentialBackoff;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per operation (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/fanout/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Hard ceiling on operations per batch; oversized batches are rejected
    /// outright rather than split.
    pub max_batch_size: usize,
    /// Maximum concurrent requests in flight within one batch.
    pub max_concurrent_requests: usize,
    /// Per-request timeout in seconds, enforced by the HTTP client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Wait in seconds applied to a 429 whose Retry-After header is missing
    /// or unusable.
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_default_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_secs() -> u64 {
    60
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            max_concurrent_requests: 8,
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_default_secs: default_rate_limit_secs(),
            retry: None,
        }
    }
}

impl FanoutConfig {
    /// Executor limits derived from this config.
    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_batch_size: self.max_batch_size,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }

    /// Backoff policy derived from the `[retry]` section or its defaults.
    pub fn backoff(&self) -> ExponentialBackoff {
        let retry = self.retry.clone().unwrap_or_default();
        ExponentialBackoff {
            max_attempts: retry.max_attempts,
            base_delay: Duration::from_secs_f64(retry.base_delay_secs),
            max_delay: Duration::from_secs(retry.max_delay_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fanout")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FanoutConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FanoutConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FanoutConfig = toml::from_str(&data)?;
    Ok(cfg)
}
