use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::cleanup::CleanupConfig;
use crate::fetcher::FetcherConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Sticker set metadata cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum number of sticker sets kept in memory
    #[serde(default = "default_cache_capacity")]
    pub sticker_sets: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sticker_sets: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    64
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub telegram: SanitizedTelegramConfig,
    pub server: ServerConfig,
    pub fetcher: SanitizedFetcherConfig,
    pub transcoder: TranscoderConfig,
    pub cleanup: CleanupConfig,
    pub cache: CacheConfig,
}

/// Sanitized Telegram config (bot token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_base_url: String,
    pub bot_token_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedFetcherConfig {
    pub output_dir: PathBuf,
    pub max_concurrent_downloads: usize,
    pub max_download_attempts: u32,
    pub backoff_unit_ms: u64,
    pub download_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            telegram: SanitizedTelegramConfig {
                api_base_url: config.telegram.api_base_url.clone(),
                bot_token_configured: !config.telegram.bot_token.is_empty(),
                timeout_secs: config.telegram.timeout_secs,
            },
            server: config.server.clone(),
            fetcher: SanitizedFetcherConfig {
                output_dir: config.fetcher.output_dir.clone(),
                max_concurrent_downloads: config.fetcher.max_concurrent_downloads,
                max_download_attempts: config.fetcher.max_download_attempts,
                backoff_unit_ms: config.fetcher.backoff_unit_ms,
                download_timeout_secs: config.fetcher.download_timeout_secs,
            },
            transcoder: config.transcoder.clone(),
            cleanup: config.cleanup.clone(),
            cache: config.cache.clone(),
        }
    }
}
