//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transcoder::{
    gif_path_for, GifOptions, GifOutput, GifPlan, GifSource, MediaProbe, Transcoder,
    TranscoderError,
};

/// Bytes written as the "converted" GIF.
pub const MOCK_GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";

/// Mock implementation of the Transcoder trait.
///
/// Applies the same format gate as the real transcoder, so vector
/// animations are rejected, then writes a tiny GIF next to the input
/// instead of spawning anything.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    conversions: Arc<RwLock<Vec<PathBuf>>>,
    probe: Arc<RwLock<MediaProbe>>,
    next_error: Arc<RwLock<Option<TranscoderError>>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a mock that reports every input as a 512x512 animation.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            probe: Arc::new(RwLock::new(MediaProbe {
                frame_count: Some(24),
                width: 512,
                height: 512,
            })),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the probe reported for every input.
    pub async fn set_probe(&self, probe: MediaProbe) {
        *self.probe.write().await = probe;
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: TranscoderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Inputs that were converted successfully.
    pub async fn recorded_conversions(&self) -> Vec<PathBuf> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, input: &Path) -> Result<MediaProbe, TranscoderError> {
        GifSource::from_path(input)?;
        Ok(self.probe.read().await.clone())
    }

    async fn convert(
        &self,
        input: &Path,
        options: &GifOptions,
    ) -> Result<GifOutput, TranscoderError> {
        let source = GifSource::from_path(input)?;
        if !input.exists() {
            return Err(TranscoderError::InputNotFound {
                path: input.to_path_buf(),
            });
        }
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let probe = self.probe.read().await.clone();
        let plan = GifPlan::decide(source, &probe, options.max_fps);
        let output_path = gif_path_for(input);
        tokio::fs::write(&output_path, MOCK_GIF_BYTES).await?;

        self.conversions.write().await.push(input.to_path_buf());

        Ok(GifOutput {
            output_path,
            plan,
            output_size_bytes: MOCK_GIF_BYTES.len() as u64,
            duration_ms: 0,
        })
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        Ok(())
    }
}
