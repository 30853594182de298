use std::sync::Arc;

use stickerpack_core::{
    BatchOrchestrator, CleanupScheduler, Config, Messenger, SanitizedConfig, SetCache,
    StickerSource,
};

/// Shared application state
pub struct AppState {
    config: Config,
    config_hash: String,
    source: Arc<dyn StickerSource>,
    messenger: Arc<dyn Messenger>,
    orchestrator: BatchOrchestrator,
    cache: SetCache,
    cleanup: CleanupScheduler,
}

impl AppState {
    pub fn new(
        config: Config,
        source: Arc<dyn StickerSource>,
        messenger: Arc<dyn Messenger>,
        orchestrator: BatchOrchestrator,
        cleanup: CleanupScheduler,
    ) -> Self {
        let cache = SetCache::new(config.cache.sticker_sets);
        let config_hash = config_hash(&config);
        Self {
            config,
            config_hash,
            source,
            messenger,
            orchestrator,
            cache,
            cleanup,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Short hash of the loaded configuration, for support/debugging.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn source(&self) -> &dyn StickerSource {
        self.source.as_ref()
    }

    pub fn messenger(&self) -> &dyn Messenger {
        self.messenger.as_ref()
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    pub fn cache(&self) -> &SetCache {
        &self.cache
    }

    pub fn cleanup(&self) -> &CleanupScheduler {
        &self.cleanup
    }
}

/// First 16 hex chars of the SHA-256 of the serialized config.
pub fn config_hash(config: &Config) -> String {
    use sha2::{Digest, Sha256};

    let json = serde_json::to_string(config).unwrap_or_default();
    let hash = format!("{:x}", Sha256::digest(json.as_bytes()));
    hash[..16].to_string()
}
