//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for asset downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Directory that holds workspaces and finished archives.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Process-wide cap on simultaneous downloads.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Attempts per asset, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_download_attempts: u32,

    /// Base delay unit for retry backoff in milliseconds.
    #[serde(default = "default_backoff_unit")]
    pub backoff_unit_ms: u64,

    /// Timeout for a single download attempt in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("download")
}

fn default_max_concurrent() -> usize {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit() -> u64 {
    1000
}

fn default_download_timeout() -> u64 {
    60
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_concurrent_downloads: default_max_concurrent(),
            max_download_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl FetcherConfig {
    /// Delay before retrying after failed attempt `attempt` (1-based).
    ///
    /// Grows linearly: `attempt * max_attempts * unit`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let units = u64::from(attempt) * u64::from(self.max_download_attempts);
        Duration::from_millis(units.saturating_mul(self.backoff_unit_ms))
    }

    /// Timeout applied to each download attempt.
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
