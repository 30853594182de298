use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Telegram bot token is set
/// - Server port is not 0
/// - Fetcher limits and transcoder settings are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "telegram.bot_token cannot be empty".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.fetcher.max_concurrent_downloads == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.max_concurrent_downloads must be at least 1".to_string(),
        ));
    }

    if config.fetcher.max_download_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "fetcher.max_download_attempts must be at least 1".to_string(),
        ));
    }

    if config.transcoder.max_gif_fps == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.max_gif_fps must be at least 1".to_string(),
        ));
    }

    if config.transcoder.target_width == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.target_width cannot be 0".to_string(),
        ));
    }

    if config.cache.sticker_sets == 0 {
        return Err(ConfigError::ValidationError(
            "cache.sticker_sets must be at least 1".to_string(),
        ));
    }

    Ok(())
}
