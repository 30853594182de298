//! Prometheus metrics for the HTTP server.
//!
//! Request-level metrics live here; batch, download and conversion metrics
//! come from the core and are registered into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stickerpack_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stickerpack_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stickerpack_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// State gauges (collected on scrape)
// =============================================================================

/// Sticker sets held in the metadata cache.
pub static SET_CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stickerpack_set_cache_entries",
        "Number of sticker sets in the metadata cache",
    )
    .unwrap()
});

/// Deferred cleanups not yet run.
pub static CLEANUPS_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stickerpack_cleanups_pending",
        "Number of scheduled cleanups waiting for their delay",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(SET_CACHE_ENTRIES.clone()))
        .unwrap();
    registry
        .register(Box::new(CLEANUPS_PENDING.clone()))
        .unwrap();

    // Core metrics (downloads, conversions, batches, bot API)
    for metric in stickerpack_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh gauges that mirror application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let stats = state.cache().stats().await;
    SET_CACHE_ENTRIES.set(stats.size as i64);
    CLEANUPS_PENDING.set(state.cleanup().pending() as i64);
}

/// Normalize a path for metric labels.
///
/// Set names are user supplied, so the segment after `/sets/` becomes `{name}`.
pub fn normalize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut after_sets = false;
    for segment in path.split('/') {
        if after_sets && !segment.is_empty() {
            out.push("{name}");
        } else {
            out.push(segment);
        }
        after_sets = segment == "sets";
    }
    out.join("/")
}
