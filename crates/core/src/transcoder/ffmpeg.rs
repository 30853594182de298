//! FFmpeg-based GIF transcoder.
//!
//! Conversion runs in two passes: the first builds an optimal 256-colour
//! palette from every frame, the second maps the source onto it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::TranscoderConfig;
use super::error::TranscoderError;
use super::traits::Transcoder;
use super::types::{
    gif_path_for, GifOptions, GifOutput, GifPlan, GifSource, MediaProbe, FALLBACK_DIMENSION,
};

/// Which binary a run uses, for error mapping.
#[derive(Debug, Clone, Copy)]
enum Tool {
    Ffmpeg,
    Ffprobe,
}

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    fn build_frame_probe_args(input: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "frame=pkt_pts_time".to_string(),
            "-of".to_string(),
            "csv=p=0".to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    fn build_size_probe_args(input: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=width,height".to_string(),
            "-of".to_string(),
            "csv=p=0:s=x".to_string(),
            input.to_string_lossy().to_string(),
        ]
    }

    /// Builds arguments for the palette generation pass.
    fn build_palette_args(&self, input: &Path, palette: &Path, options: &GifOptions) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            format!(
                "scale={}:-1:flags=lanczos,palettegen=stats_mode=full",
                options.target_width
            ),
            palette.to_string_lossy().to_string(),
        ]
    }

    /// Builds arguments for the palette application pass.
    fn build_apply_args(
        &self,
        input: &Path,
        palette: &Path,
        output: &Path,
        plan: &GifPlan,
        options: &GifOptions,
    ) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-i".to_string(),
            palette.to_string_lossy().to_string(),
            "-r".to_string(),
            plan.fps.to_string(),
            "-filter_complex".to_string(),
            format!(
                "scale={}:-1:flags=lanczos[x];[x][1:v]paletteuse=dither={}:alpha_threshold={}",
                options.target_width,
                plan.dither.ffmpeg_value(),
                options.alpha_threshold
            ),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Counts frame lines in ffprobe's csv output.
    fn parse_frame_count(stdout: &str) -> usize {
        stdout.lines().filter(|l| !l.trim().is_empty()).count()
    }

    /// Parses `WIDTHxHEIGHT`, falling back to 512x512 on anything else.
    fn parse_dimensions(stdout: &str) -> (u32, u32) {
        let parsed = stdout.lines().next().and_then(|line| {
            let (w, h) = line.trim().split_once('x')?;
            let w = w.trim().parse::<u32>().ok()?;
            let h = h.trim().parse::<u32>().ok()?;
            Some((w, h))
        });

        parsed.unwrap_or((FALLBACK_DIMENSION, FALLBACK_DIMENSION))
    }

    /// Runs one tool invocation, killing it if it exceeds the timeout.
    async fn run(
        &self,
        tool: Tool,
        stage: &'static str,
        args: &[String],
    ) -> Result<Output, TranscoderError> {
        let program = match tool {
            Tool::Ffmpeg => &self.config.ffmpeg_path,
            Tool::Ffprobe => &self.config.ffprobe_path,
        };

        debug!(stage, program = %program.display(), ?args, "Spawning");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    match tool {
                        Tool::Ffmpeg => TranscoderError::FfmpegNotFound {
                            path: program.clone(),
                        },
                        Tool::Ffprobe => TranscoderError::FfprobeNotFound {
                            path: program.clone(),
                        },
                    }
                } else {
                    TranscoderError::Io(e)
                }
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TranscoderError::Timeout {
                stage,
                timeout_secs: self.config.timeout_secs,
            }),
        }
    }

    /// Runs an ffmpeg pass and fails on a non-zero exit.
    async fn run_pass(&self, stage: &'static str, args: &[String]) -> Result<(), TranscoderError> {
        let output = self.run(Tool::Ffmpeg, stage, args).await?;
        if !output.status.success() {
            return Err(TranscoderError::ProcessFailed {
                stage,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn probe_source(
        &self,
        input: &Path,
        source: GifSource,
    ) -> Result<MediaProbe, TranscoderError> {
        let frame_count = match source {
            GifSource::Raster => {
                let output = self
                    .run(Tool::Ffprobe, "probe", &Self::build_frame_probe_args(input))
                    .await?;
                Some(Self::parse_frame_count(&String::from_utf8_lossy(
                    &output.stdout,
                )))
            }
            GifSource::Video => None,
        };

        let output = self
            .run(Tool::Ffprobe, "probe", &Self::build_size_probe_args(input))
            .await?;
        let (width, height) = Self::parse_dimensions(&String::from_utf8_lossy(&output.stdout));

        Ok(MediaProbe {
            frame_count,
            width,
            height,
        })
    }

    async fn run_passes(
        &self,
        input: &Path,
        output: &Path,
        plan: &GifPlan,
        options: &GifOptions,
    ) -> Result<(), TranscoderError> {
        // Palette lives only for the duration of this conversion.
        let scratch = tempfile::Builder::new().prefix("palette").tempdir()?;
        let palette = scratch.path().join("palette.png");

        self.run_pass("palette", &self.build_palette_args(input, &palette, options))
            .await?;
        self.run_pass(
            "apply",
            &self.build_apply_args(input, &palette, output, plan, options),
        )
        .await
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, input: &Path) -> Result<MediaProbe, TranscoderError> {
        let source = GifSource::from_path(input)?;
        if !input.exists() {
            return Err(TranscoderError::InputNotFound {
                path: input.to_path_buf(),
            });
        }
        self.probe_source(input, source).await
    }

    async fn convert(
        &self,
        input: &Path,
        options: &GifOptions,
    ) -> Result<GifOutput, TranscoderError> {
        let start = Instant::now();
        let source = GifSource::from_path(input)?;
        if !input.exists() {
            return Err(TranscoderError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let probe = self.probe_source(input, source).await?;
        let plan = GifPlan::decide(source, &probe, options.max_fps);
        let output_path: PathBuf = gif_path_for(input);

        debug!(
            input = %input.display(),
            fps = plan.fps,
            dither = %plan.dither,
            width = probe.width,
            height = probe.height,
            "Converting to GIF"
        );

        if let Err(e) = self.run_passes(input, &output_path, &plan, options).await {
            if let Err(rm) = tokio::fs::remove_file(&output_path).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %output_path.display(), error = %rm, "Failed to remove partial GIF");
                }
            }
            return Err(e);
        }

        let meta = tokio::fs::metadata(&output_path).await.map_err(|_| {
            TranscoderError::ProcessFailed {
                stage: "apply",
                code: Some(0),
                stderr: "output file not created".to_string(),
            }
        })?;

        Ok(GifOutput {
            output_path,
            plan,
            output_size_bytes: meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        let args = vec!["-version".to_string()];
        self.run(Tool::Ffmpeg, "validate", &args).await?;
        self.run(Tool::Ffprobe, "validate", &args).await?;
        Ok(())
    }
}
