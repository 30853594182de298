//! Testing utilities and mock implementations.
//!
//! Mocks for every external collaborator, so batches can run end to end
//! without Telegram or ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use stickerpack_core::testing::{fixtures, MockStickerSource, MockTranscoder};
//!
//! let source = MockStickerSource::new();
//! source.add_set(fixtures::sticker_set("cats", 3)).await;
//! for id in fixtures::file_ids(3) {
//!     source.add_file(&id, fixtures::webp_bytes()).await;
//! }
//! ```

mod mock_messenger;
mod mock_source;
mod mock_transcoder;

pub use mock_messenger::{MockMessenger, SentDocument};
pub use mock_source::MockStickerSource;
pub use mock_transcoder::{MockTranscoder, MOCK_GIF_BYTES};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::source::{Sticker, StickerKind, StickerSet};

    pub use crate::sniff::fixtures::{tgs_bytes, webm_bytes, webp_bytes};

    /// File ids used by `sticker_set`, in set order.
    pub fn file_ids(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("file-{}", i)).collect()
    }

    /// A set of `count` static 512x512 stickers.
    pub fn sticker_set(name: &str, count: usize) -> StickerSet {
        StickerSet {
            name: name.to_string(),
            title: format!("{} stickers", name),
            stickers: file_ids(count)
                .into_iter()
                .map(|id| Sticker {
                    file_unique_id: format!("u-{}", id),
                    file_id: id,
                    kind: StickerKind::Static,
                    width: 512,
                    height: 512,
                    emoji: Some("🙂".to_string()),
                })
                .collect(),
        }
    }
}
