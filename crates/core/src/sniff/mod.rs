//! Content-based format detection.
//!
//! A sticker's declared extension is never trusted; the real type is read
//! from the leading bytes and the file is relabelled to match.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Bytes inspected when sniffing.
const SNIFF_LEN: u64 = 8192;

/// Broad media family of a sniffed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Still or animated raster image (WebP, PNG, ...).
    Raster,
    /// Video container (WebM/Matroska).
    VideoContainer,
    /// Vector animation (TGS, gzipped Lottie JSON).
    VectorAnimation,
    /// Anything else.
    Unknown,
}

impl MediaKind {
    /// Extension a file of this kind is relabelled to, if it has a fixed one.
    pub fn forced_extension(&self) -> Option<&'static str> {
        match self {
            Self::VideoContainer => Some("webm"),
            Self::VectorAnimation => Some("tgs"),
            Self::Raster | Self::Unknown => None,
        }
    }
}

/// Result of sniffing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sniffed {
    pub mime: String,
    pub kind: MediaKind,
}

/// Maps a MIME type onto a media family.
pub fn classify_mime(mime: &str) -> MediaKind {
    match mime {
        "video/webm" | "video/x-matroska" => MediaKind::VideoContainer,
        "application/x-tgsticker" | "application/gzip" | "application/json" => {
            MediaKind::VectorAnimation
        }
        m if m.starts_with("image/") => MediaKind::Raster,
        _ => MediaKind::Unknown,
    }
}

/// Sniffs a byte prefix.
pub fn sniff_bytes(buf: &[u8]) -> Sniffed {
    let mime = match infer::get(buf) {
        Some(kind) => kind.mime_type().to_string(),
        // Uncompressed Lottie is plain JSON, which has no magic number.
        None if looks_like_json(buf) => "application/json".to_string(),
        None => "application/octet-stream".to_string(),
    };
    let kind = classify_mime(&mime);
    Sniffed { mime, kind }
}

fn looks_like_json(buf: &[u8]) -> bool {
    buf.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

/// Sniffs the file at `path`.
pub async fn sniff_file(path: &Path) -> std::io::Result<Sniffed> {
    let file = tokio::fs::File::open(path).await?;
    let mut buf = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut buf).await?;
    Ok(sniff_bytes(&buf))
}

/// Path a file of `kind` should carry.
pub fn relabelled_path(path: &Path, kind: MediaKind) -> PathBuf {
    match kind.forced_extension() {
        Some(ext) => path.with_extension(ext),
        None => path.to_path_buf(),
    }
}

/// Renames `path` to match `kind`, returning the new location.
pub async fn relabel(path: &Path, kind: MediaKind) -> std::io::Result<PathBuf> {
    let target = relabelled_path(path, kind);
    if target != path {
        tokio::fs::rename(path, &target).await?;
    }
    Ok(target)
}

/// Minimal headers each format is recognised by, for tests.
pub mod fixtures {
    /// Minimal RIFF/WEBP header.
    pub fn webp_bytes() -> Vec<u8> {
        let mut buf = b"RIFF\x24\x00\x00\x00WEBPVP8 ".to_vec();
        buf.extend_from_slice(&[0u8; 32]);
        buf
    }

    /// Minimal EBML header with a "webm" doctype.
    pub fn webm_bytes() -> Vec<u8> {
        let mut buf = vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01];
        buf.extend_from_slice(&[0x42, 0x82, 0x84]);
        buf.extend_from_slice(b"webm");
        buf.extend_from_slice(&[0u8; 32]);
        buf
    }

    /// Gzip stream header, as carried by TGS files.
    pub fn tgs_bytes() -> Vec<u8> {
        let mut buf = vec![0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03];
        buf.extend_from_slice(&[0u8; 32]);
        buf
    }
}
