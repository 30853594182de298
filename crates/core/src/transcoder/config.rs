//! Configuration for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based GIF transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Frame rate used for animated sources.
    #[serde(default = "default_max_gif_fps")]
    pub max_gif_fps: u32,

    /// Width every GIF is scaled to (height follows the aspect ratio).
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// Alpha below this becomes fully transparent, the rest fully opaque.
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: u8,

    /// Timeout for a single ffmpeg/ffprobe run in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_max_gif_fps() -> u32 {
    24
}

fn default_target_width() -> u32 {
    512
}

fn default_alpha_threshold() -> u8 {
    128
}

fn default_timeout() -> u64 {
    120
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            max_gif_fps: default_max_gif_fps(),
            target_width: default_target_width(),
            alpha_threshold: default_alpha_threshold(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the maximum GIF frame rate.
    pub fn with_max_fps(mut self, fps: u32) -> Self {
        self.max_gif_fps = fps;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
