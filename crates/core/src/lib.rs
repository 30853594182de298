pub mod archive;
pub mod batch;
pub mod cache;
pub mod cleanup;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod sniff;
pub mod source;
pub mod testing;
pub mod transcoder;

pub use archive::{ArchiveEntry, ArchiveError, ArchiveInfo};
pub use batch::{
    AssetFailure, BatchError, BatchOrchestrator, BatchOutcome, BatchSummary, SetRequest, Workspace,
};
pub use cache::{CacheStats, SetCache};
pub use cleanup::{CleanupConfig, CleanupScheduler, CleanupTarget};
pub use config::{
    load_config, load_config_from_str, validate_config, CacheConfig, Config, ConfigError,
    SanitizedConfig, ServerConfig, TelegramConfig,
};
pub use fetcher::{AssetRef, DownloadPool, FetchResult, Fetcher, FetcherConfig, OutputFormat};
pub use sniff::{MediaKind, Sniffed};
pub use source::{
    MessageRef, Messenger, SourceError, Sticker, StickerKind, StickerSet, StickerSource,
    TelegramClient,
};
pub use transcoder::{
    Dither, FfmpegTranscoder, GifOptions, GifOutput, GifPlan, Transcoder, TranscoderConfig,
    TranscoderError,
};
