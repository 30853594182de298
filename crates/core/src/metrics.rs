//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Fetcher (downloads, retries, pool occupancy)
//! - Transcoder (GIF conversions)
//! - Batches and deferred cleanup
//! - The Telegram API

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Fetcher
// =============================================================================

/// Asset downloads by final result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stickerpack_downloads_total", "Total asset downloads"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Download retries by error class.
pub static DOWNLOAD_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stickerpack_download_retries_total",
            "Download attempts that were retried after a transient error",
        ),
        &["reason"], // "timeout", "connection", "rate_limited", "server", "io"
    )
    .unwrap()
});

/// Download duration in seconds, including retries.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stickerpack_download_duration_seconds",
            "Duration of a single asset fetch including retries",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

/// Downloads currently holding a pool slot.
pub static DOWNLOADS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stickerpack_downloads_in_flight",
        "Downloads currently holding a pool slot",
    )
    .unwrap()
});

// =============================================================================
// Transcoder
// =============================================================================

/// GIF conversions by result and dither.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stickerpack_conversions_total", "Total GIF conversions"),
        &["result", "dither"], // result: "success", "failed", "unsupported"
    )
    .unwrap()
});

/// GIF conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stickerpack_conversion_duration_seconds",
            "Duration of a two-pass GIF conversion",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Batches
// =============================================================================

/// Batches by result and requested format.
pub static BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stickerpack_batches_total", "Total sticker-set batches"),
        &["result", "format"],
    )
    .unwrap()
});

/// Assets per batch.
pub static BATCH_ASSETS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("stickerpack_batch_assets", "Number of assets per batch")
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 120.0, 200.0]),
        &[],
    )
    .unwrap()
});

/// Archive size in bytes.
pub static ARCHIVE_BYTES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("stickerpack_archive_bytes", "Size of produced archives")
            .buckets(vec![
                16_384.0, 65_536.0, 262_144.0, 1_048_576.0, 4_194_304.0, 16_777_216.0, 67_108_864.0,
            ]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Cleanup
// =============================================================================

/// Deferred cleanups that ran to completion.
pub static CLEANUPS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stickerpack_cleanups_completed_total",
        "Deferred cleanups that ran",
    )
    .unwrap()
});

/// Deferred cleanups skipped because of shutdown.
pub static CLEANUPS_CANCELLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stickerpack_cleanups_cancelled_total",
        "Deferred cleanups cancelled before their delay elapsed",
    )
    .unwrap()
});

// =============================================================================
// External services
// =============================================================================

/// Telegram API requests by method and result.
pub static TELEGRAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stickerpack_telegram_requests_total",
            "Telegram Bot API requests",
        ),
        &["method", "result"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_RETRIES.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(DOWNLOADS_IN_FLIGHT.clone()),
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(BATCHES_TOTAL.clone()),
        Box::new(BATCH_ASSETS.clone()),
        Box::new(ARCHIVE_BYTES.clone()),
        Box::new(CLEANUPS_COMPLETED.clone()),
        Box::new(CLEANUPS_CANCELLED.clone()),
        Box::new(TELEGRAM_REQUESTS.clone()),
    ]
}
