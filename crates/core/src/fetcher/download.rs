//! Single-asset fetch: download with retries, sniff, relabel, transcode.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::metrics;
use crate::sniff;
use crate::source::{SourceError, StickerSource};
use crate::transcoder::{GifOptions, Transcoder, TranscoderError};

use super::config::FetcherConfig;
use super::pool::DownloadPool;
use super::types::{AssetRef, FetchResult, OutputFormat};

/// Fetches individual assets under the shared download pool.
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn StickerSource>,
    transcoder: Arc<dyn Transcoder>,
    pool: DownloadPool,
    config: FetcherConfig,
    gif_options: GifOptions,
}

impl Fetcher {
    pub fn new(
        source: Arc<dyn StickerSource>,
        transcoder: Arc<dyn Transcoder>,
        pool: DownloadPool,
        config: FetcherConfig,
        gif_options: GifOptions,
    ) -> Self {
        Self {
            source,
            transcoder,
            pool,
            config,
            gif_options,
        }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn pool(&self) -> &DownloadPool {
        &self.pool
    }

    /// Fetches one asset into `dest`.
    ///
    /// Never fails: every problem is reported in the returned `FetchResult`.
    /// The pool slot is held for the whole call, conversion included.
    pub async fn fetch_one(&self, asset: &AssetRef, dest: &Path, format: OutputFormat) -> FetchResult {
        let start = Instant::now();

        let _slot = match self.pool.acquire().await {
            Ok(slot) => slot,
            Err(_) => return FetchResult::failure(&asset.id, "download pool closed", 0),
        };

        let result = self.fetch_inner(asset, dest, format).await;

        let label = if result.ok { "success" } else { "failed" };
        metrics::DOWNLOADS_TOTAL.with_label_values(&[label]).inc();
        metrics::DOWNLOAD_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn fetch_inner(&self, asset: &AssetRef, dest: &Path, format: OutputFormat) -> FetchResult {
        let attempts = match self.download_with_retry(asset, dest).await {
            Ok(attempts) => attempts,
            Err((e, attempts)) => {
                remove_quietly(dest).await;
                return FetchResult::failure(&asset.id, e.to_string(), attempts);
            }
        };

        let path = match self.sniff_and_relabel(dest).await {
            Ok(path) => path,
            Err(e) => {
                remove_quietly(dest).await;
                return FetchResult::failure(
                    &asset.id,
                    format!("failed to identify downloaded file: {}", e),
                    attempts,
                );
            }
        };

        match format {
            OutputFormat::Native => FetchResult::success(&asset.id, path, false, attempts),
            OutputFormat::Gif => match self.convert(&path).await {
                Ok(gif) => {
                    remove_quietly(&path).await;
                    FetchResult::success(&asset.id, gif, true, attempts)
                }
                Err(e) => {
                    // A failed asset must not leave anything behind for the archive.
                    remove_quietly(&path).await;
                    FetchResult::failure(&asset.id, e.to_string(), attempts)
                }
            },
        }
    }

    /// Returns the number of attempts made, or the last error with it.
    async fn download_with_retry(
        &self,
        asset: &AssetRef,
        dest: &Path,
    ) -> Result<u32, (SourceError, u32)> {
        let max_attempts = self.config.max_download_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(asset = %asset.id, attempt, max_attempts, "Downloading asset");

            let outcome = match timeout(
                self.config.download_timeout(),
                self.source.download(&asset.id, dest),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(SourceError::Timeout),
            };

            match outcome {
                Ok(bytes) => {
                    debug!(asset = %asset.id, attempt, bytes, "Downloaded asset");
                    return Ok(attempt);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        asset = %asset.id,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Download failed, retrying"
                    );
                    metrics::DOWNLOAD_RETRIES
                        .with_label_values(&[retry_reason(&e)])
                        .inc();
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(asset = %asset.id, attempt, error = %e, "Download failed");
                    return Err((e, attempt));
                }
            }
        }
    }

    async fn sniff_and_relabel(&self, path: &Path) -> std::io::Result<PathBuf> {
        let sniffed = sniff::sniff_file(path).await?;
        debug!(path = %path.display(), mime = %sniffed.mime, kind = ?sniffed.kind, "Sniffed");
        sniff::relabel(path, sniffed.kind).await
    }

    async fn convert(&self, path: &Path) -> Result<PathBuf, TranscoderError> {
        let start = Instant::now();
        match self.transcoder.convert(path, &self.gif_options).await {
            Ok(output) => {
                metrics::CONVERSIONS_TOTAL
                    .with_label_values(&["success", dither_label(&output.plan.dither)])
                    .inc();
                metrics::CONVERSION_DURATION
                    .with_label_values(&[])
                    .observe(start.elapsed().as_secs_f64());
                Ok(output.output_path)
            }
            Err(e) => {
                let result = match e {
                    TranscoderError::UnsupportedFormat { .. } => "unsupported",
                    _ => "failed",
                };
                metrics::CONVERSIONS_TOTAL
                    .with_label_values(&[result, "none"])
                    .inc();
                warn!(path = %path.display(), error = %e, "GIF conversion failed");
                Err(e)
            }
        }
    }
}

fn retry_reason(e: &SourceError) -> &'static str {
    match e {
        SourceError::Timeout => "timeout",
        SourceError::ConnectionFailed(_) => "connection",
        SourceError::RateLimited { .. } => "rate_limited",
        SourceError::Io(_) => "io",
        _ => "server",
    }
}

fn dither_label(dither: &crate::transcoder::Dither) -> &'static str {
    match dither {
        crate::transcoder::Dither::Bayer { .. } => "bayer",
        crate::transcoder::Dither::Sierra2_4a => "sierra2_4a",
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }
}
