//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::config::TranscoderConfig;
use super::error::TranscoderError;

/// Stickers with both sides at or below this size get ordered dithering.
pub const SMALL_STICKER_MAX_DIM: u32 = 256;

/// Dimensions assumed when the probe output cannot be parsed.
pub const FALLBACK_DIMENSION: u32 = 512;

/// Source families the GIF pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GifSource {
    /// Still or animated WebP.
    Raster,
    /// WebM video.
    Video,
}

impl GifSource {
    /// Classifies an input by its (already sniffed and relabelled) extension.
    ///
    /// Vector animations and anything unknown are rejected before any
    /// process is spawned.
    pub fn from_path(path: &Path) -> Result<Self, TranscoderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "webp" => Ok(Self::Raster),
            "webm" => Ok(Self::Video),
            "tgs" => Err(TranscoderError::unsupported(
                "tgs (Lottie vector animation)",
            )),
            "" => Err(TranscoderError::unsupported("file without extension")),
            other => Err(TranscoderError::unsupported(other.to_string())),
        }
    }
}

/// Palette dithering algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dither {
    /// Ordered Bayer pattern; crisp at tiny sizes.
    Bayer { scale: u8 },
    /// Sierra-2-4A error diffusion; smooth gradients at larger sizes.
    Sierra2_4a,
}

impl Dither {
    /// Value for ffmpeg's `paletteuse=dither=` option.
    pub fn ffmpeg_value(&self) -> String {
        match self {
            Self::Bayer { scale } => format!("bayer:bayer_scale={}", scale),
            Self::Sierra2_4a => "sierra2_4a".to_string(),
        }
    }

    /// Picks the dither for a source of the given size.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width <= SMALL_STICKER_MAX_DIM && height <= SMALL_STICKER_MAX_DIM {
            Self::Bayer { scale: 3 }
        } else {
            Self::Sierra2_4a
        }
    }
}

impl fmt::Display for Dither {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ffmpeg_value())
    }
}

/// Options for one GIF conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifOptions {
    /// Frame rate for animated sources.
    pub max_fps: u32,
    /// Output width in pixels.
    pub target_width: u32,
    /// Binary alpha cutoff.
    pub alpha_threshold: u8,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self::from(&TranscoderConfig::default())
    }
}

impl From<&TranscoderConfig> for GifOptions {
    fn from(config: &TranscoderConfig) -> Self {
        Self {
            max_fps: config.max_gif_fps,
            target_width: config.target_width,
            alpha_threshold: config.alpha_threshold,
        }
    }
}

/// Properties probed from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Distinct frames reported; only probed for raster sources.
    pub frame_count: Option<usize>,
    pub width: u32,
    pub height: u32,
}

/// Frame rate and dither chosen for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifPlan {
    pub fps: u32,
    pub dither: Dither,
}

impl GifPlan {
    /// Decides frame rate and dither from the probe.
    ///
    /// A raster reporting at most one frame is static and is written at
    /// 1 fps; everything else uses `max_fps`.
    pub fn decide(source: GifSource, probe: &MediaProbe, max_fps: u32) -> Self {
        let is_static = source == GifSource::Raster
            && probe.frame_count.map(|frames| frames <= 1).unwrap_or(false);

        Self {
            fps: if is_static { 1 } else { max_fps },
            dither: Dither::for_dimensions(probe.width, probe.height),
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifOutput {
    pub output_path: PathBuf,
    pub plan: GifPlan,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}

/// Output path for a source: a `.gif` sibling.
pub fn gif_path_for(input: &Path) -> PathBuf {
    input.with_extension("gif")
}
