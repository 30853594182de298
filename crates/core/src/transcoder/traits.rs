//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscoderError;
use super::types::{GifOptions, GifOutput, MediaProbe};

/// Turns a raster or video sticker into an animated GIF.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Probes frame count (raster only) and dimensions.
    async fn probe(&self, input: &Path) -> Result<MediaProbe, TranscoderError>;

    /// Converts `input` into a sibling `.gif`.
    ///
    /// Vector animations fail with `UnsupportedFormat` without spawning
    /// anything.
    async fn convert(
        &self,
        input: &Path,
        options: &GifOptions,
    ) -> Result<GifOutput, TranscoderError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscoderError>;
}
