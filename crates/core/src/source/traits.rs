//! Trait definitions for the sticker source.

use async_trait::async_trait;
use std::path::Path;

use super::types::{MessageRef, SourceError, StickerSet};

/// Remote catalogue of sticker sets and their files.
#[async_trait]
pub trait StickerSource: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetches metadata for a sticker set by its short name.
    async fn get_sticker_set(&self, name: &str) -> Result<StickerSet, SourceError>;

    /// Downloads one file by id into `dest`, returning the number of bytes written.
    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, SourceError>;
}

/// Chat messaging used to deliver archives and retract them later.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a local file as a document to a chat.
    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<MessageRef, SourceError>;

    /// Deletes a previously sent message.
    async fn delete_message(&self, message: &MessageRef) -> Result<(), SourceError>;
}
