use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stickerpack_core::{
    load_config, validate_config, BatchOrchestrator, CleanupScheduler, DownloadPool,
    FfmpegTranscoder, Fetcher, GifOptions, Messenger, StickerSource, TelegramClient, Transcoder,
};
use stickerpack_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stickerpack v{}", VERSION);

    // Determine config path
    let config_path = std::env::var("STICKERPACK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Output directory: {:?}", config.fetcher.output_dir);
    info!(
        "Download pool: {} concurrent, {} attempts",
        config.fetcher.max_concurrent_downloads, config.fetcher.max_download_attempts
    );

    // Telegram backs both the sticker source and the messenger
    let telegram = Arc::new(
        TelegramClient::new(config.telegram.clone()).context("Failed to create Telegram client")?,
    );
    let source: Arc<dyn StickerSource> = telegram.clone();
    let messenger: Arc<dyn Messenger> = telegram;

    // GIF output needs ffmpeg; native archives work without it
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    match transcoder.validate().await {
        Ok(()) => info!("Transcoder ready: {}", transcoder.name()),
        Err(e) => warn!("Transcoder unavailable, GIF archives will fail: {}", e),
    }

    let pool = DownloadPool::new(config.fetcher.max_concurrent_downloads);
    let fetcher = Fetcher::new(
        Arc::clone(&source),
        transcoder,
        pool,
        config.fetcher.clone(),
        GifOptions::from(&config.transcoder),
    );
    let orchestrator = BatchOrchestrator::new(fetcher);
    let cleanup = CleanupScheduler::new(Some(Arc::clone(&messenger)));

    let addr = SocketAddr::new(config.server.host, config.server.port);

    let state = Arc::new(AppState::new(
        config,
        source,
        messenger,
        orchestrator,
        cleanup.clone(),
    ));
    info!("Config hash: {}", state.config_hash());

    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!(
        "Server shutting down, cancelling {} pending cleanups",
        cleanup.pending()
    );
    cleanup.shutdown().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
