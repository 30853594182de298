//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during GIF transcoding.
///
/// None of these are retried: the pipeline is deterministic for a given input.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input cannot be turned into a GIF by this pipeline.
    #[error("Unsupported format for GIF conversion: {format}")]
    UnsupportedFormat { format: String },

    /// An ffmpeg pass exited non-zero. `stderr` is kept verbatim.
    #[error("{stage} pass failed: {stderr}")]
    ProcessFailed {
        stage: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    /// A pass exceeded the configured timeout and was killed.
    #[error("{stage} pass timed out after {timeout_secs} seconds")]
    Timeout {
        stage: &'static str,
        timeout_secs: u64,
    },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscoderError {
    /// Creates an unsupported format error.
    pub fn unsupported(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}
