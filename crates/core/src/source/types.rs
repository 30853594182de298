//! Sticker source types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the remote sticker source or messenger.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("API error ({status}): {description}")]
    Api { status: u16, description: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Network hiccups, local I/O trouble, rate limiting and server-side
    /// failures are transient. Forbidden/not-found and other client errors
    /// are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) | Self::RateLimited { .. } | Self::Io(_) => {
                true
            }
            Self::Api { status, .. } => *status >= 500,
            Self::Forbidden(_) | Self::NotFound(_) | Self::InvalidResponse(_) => false,
        }
    }

    /// Maps an HTTP status plus API description to an error.
    pub fn from_status(status: u16, description: impl Into<String>) -> Self {
        let description = description.into();
        match status {
            403 => Self::Forbidden(description),
            404 => Self::NotFound(description),
            429 => Self::RateLimited {
                retry_after_secs: None,
            },
            _ => Self::Api {
                status,
                description,
            },
        }
    }
}

/// How a sticker is encoded on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerKind {
    /// Still WebP image.
    Static,
    /// Lottie vector animation (TGS).
    Animated,
    /// WebM video.
    Video,
}

/// One sticker within a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub file_id: String,
    pub file_unique_id: String,
    pub kind: StickerKind,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

/// Sticker set metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerSet {
    pub name: String,
    pub title: String,
    pub stickers: Vec<Sticker>,
}

impl StickerSet {
    /// Number of stickers of the given kind.
    pub fn count_kind(&self, kind: StickerKind) -> usize {
        self.stickers.iter().filter(|s| s.kind == kind).count()
    }
}

/// Reference to a message previously sent by the messenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}
