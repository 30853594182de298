//! GIF transcoding for raster and video stickers.
//!
//! The `Transcoder` trait converts a sniffed sticker into a sibling `.gif`.
//! `FfmpegTranscoder` implements it with ffprobe for frame and size probes
//! and a two-pass ffmpeg palette pipeline.
//!
//! # Example
//!
//! ```ignore
//! use stickerpack_core::transcoder::{FfmpegTranscoder, GifOptions, Transcoder};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! transcoder.validate().await?;
//!
//! let gif = transcoder.convert(Path::new("download/set_1a2b3c4d/0.webp"), &GifOptions::default()).await?;
//! println!("{} fps, dither {}", gif.plan.fps, gif.plan.dither);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscoderError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{
    gif_path_for, Dither, GifOptions, GifOutput, GifPlan, GifSource, MediaProbe,
    FALLBACK_DIMENSION, SMALL_STICKER_MAX_DIM,
};
