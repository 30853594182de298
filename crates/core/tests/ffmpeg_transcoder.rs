//! FFmpeg transcoder integration tests against stand-in binaries.
//!
//! Shell scripts play ffprobe and ffmpeg so the real process handling
//! (argument order, exit codes, stderr, timeouts, palette cleanup) runs
//! without a media toolchain installed.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use stickerpack_core::{
    transcoder::{FfmpegTranscoder, GifOptions, Transcoder, TranscoderConfig, TranscoderError},
    Dither,
};

/// Prints one frame line per `FRAMES` and `WIDTHxHEIGHT` from `SIZE`,
/// both read from files next to the input.
const FAKE_FFPROBE: &str = r#"#!/bin/sh
[ "$1" = "-version" ] && { echo "ffprobe version fake"; exit 0; }
for last; do :; done
dir=$(dirname "$last")
case "$*" in
  *frame=pkt_pts_time*)
    n=$(cat "$dir/FRAMES" 2>/dev/null || echo 1)
    i=0
    while [ "$i" -lt "$n" ]; do echo "0.$i"; i=$((i+1)); done
    ;;
  *stream=width,height*)
    cat "$dir/SIZE" 2>/dev/null || echo "garbage"
    ;;
esac
exit 0
"#;

/// Records its arguments, fails for inputs named `broken.*`, hangs for
/// `slow.*` and otherwise writes its last argument.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
[ "$1" = "-version" ] && { echo "ffmpeg version fake"; exit 0; }
for last; do :; done
case "$*" in
  *broken.*) echo "Invalid data found when processing input" >&2; exit 1 ;;
  *slow.*) exec sleep 30 ;;
esac
echo "$*" >> "$LOG_DIR/ffmpeg.log"
printf 'GIF89a' > "$last"
exit 0
"#;

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}

struct Fakes {
    _bin: TempDir,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

fn fakes(log_dir: &Path) -> Fakes {
    let bin = TempDir::new().unwrap();
    let ffmpeg = bin.path().join("ffmpeg");
    let ffprobe = bin.path().join("ffprobe");
    write_script(
        &ffmpeg,
        &FAKE_FFMPEG.replace("$LOG_DIR", &log_dir.to_string_lossy()),
    );
    write_script(&ffprobe, FAKE_FFPROBE);
    Fakes {
        _bin: bin,
        ffmpeg,
        ffprobe,
    }
}

fn input(dir: &Path, name: &str, frames: usize, size: &str) -> PathBuf {
    std::fs::write(dir.join("FRAMES"), frames.to_string()).unwrap();
    std::fs::write(dir.join("SIZE"), size).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"media").unwrap();
    path
}

// Scenarios share one test so the scripts are never written while another
// test thread is spawning processes.
#[tokio::test]
async fn test_two_pass_pipeline_with_fake_binaries() {
    let work = TempDir::new().unwrap();
    let fakes = fakes(work.path());
    let transcoder = FfmpegTranscoder::new(
        TranscoderConfig::with_paths(fakes.ffmpeg.clone(), fakes.ffprobe.clone()).with_timeout(2),
    );
    let options = GifOptions::default();
    let log = work.path().join("ffmpeg.log");

    transcoder.validate().await.unwrap();

    // Small static WebP: 1 fps, ordered dither.
    let still = input(work.path(), "1.webp", 1, "128x128\n");
    let out = transcoder.convert(&still, &options).await.unwrap();
    assert_eq!(out.output_path, work.path().join("1.gif"));
    assert_eq!(out.plan.fps, 1);
    assert_eq!(out.plan.dither, Dither::Bayer { scale: 3 });
    assert!(out.output_path.exists());

    let calls = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = calls.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("palettegen=stats_mode=full"));
    assert!(lines[1].contains("-r 1"));
    assert!(lines[1].contains("dither=bayer:bayer_scale=3:alpha_threshold=128"));

    // The palette lived in a scoped temp dir that is gone now.
    let palette = lines[0].split_whitespace().last().unwrap();
    assert!(palette.ends_with("palette.png"));
    assert!(!Path::new(palette).exists());

    // Large video: max fps, error diffusion.
    let video = input(work.path(), "2.webm", 1, "512x512\n");
    let out = transcoder.convert(&video, &options).await.unwrap();
    assert_eq!(out.plan.fps, 24);
    assert_eq!(out.plan.dither, Dither::Sierra2_4a);

    // Animated WebP with unparsable size falls back to 512x512.
    let animated = input(work.path(), "3.webp", 12, "");
    let out = transcoder.convert(&animated, &options).await.unwrap();
    assert_eq!(out.plan.fps, 24);
    assert_eq!(out.plan.dither, Dither::Sierra2_4a);

    // Non-zero exit keeps stderr and leaves no GIF behind.
    let broken = input(work.path(), "broken.webp", 3, "100x100");
    let err = transcoder.convert(&broken, &options).await.unwrap_err();
    match err {
        TranscoderError::ProcessFailed { stage, stderr, .. } => {
            assert_eq!(stage, "palette");
            assert!(stderr.contains("Invalid data found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!work.path().join("broken.gif").exists());

    // A hung pass is killed at the timeout.
    let slow = input(work.path(), "slow.webm", 1, "64x64");
    let err = transcoder.convert(&slow, &options).await.unwrap_err();
    assert!(matches!(err, TranscoderError::Timeout { .. }));

    // Vector animation never reaches a process.
    let calls_before = std::fs::read_to_string(&log).unwrap().lines().count();
    let tgs = input(work.path(), "9.tgs", 1, "512x512");
    let err = transcoder.convert(&tgs, &options).await.unwrap_err();
    assert!(matches!(err, TranscoderError::UnsupportedFormat { .. }));
    assert_eq!(
        std::fs::read_to_string(&log).unwrap().lines().count(),
        calls_before
    );
}
