//! Remote sticker source and messaging.
//!
//! `StickerSource` resolves sticker sets and downloads individual files;
//! `Messenger` delivers finished archives and retracts them later. The
//! Telegram Bot API backs both in production.

mod telegram;
mod traits;
mod types;

pub use telegram::TelegramClient;
pub use traits::{Messenger, StickerSource};
pub use types::{MessageRef, SourceError, Sticker, StickerKind, StickerSet};
