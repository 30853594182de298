//! Mock messenger for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{MessageRef, Messenger, SourceError};

/// A document the mock pretended to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDocument {
    pub message: MessageRef,
    pub path: PathBuf,
    pub caption: String,
}

/// Mock implementation of the Messenger trait.
#[derive(Debug, Clone)]
pub struct MockMessenger {
    sent: Arc<RwLock<Vec<SentDocument>>>,
    deleted: Arc<RwLock<Vec<MessageRef>>>,
    next_message_id: Arc<AtomicI64>,
    fail_sends: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            deleted: Arc::new(RwLock::new(Vec::new())),
            next_message_id: Arc::new(AtomicI64::new(1)),
            fail_sends: Arc::new(AtomicBool::new(false)),
            fail_deletes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every `send_document` fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make every `delete_message` fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn sent_documents(&self) -> Vec<SentDocument> {
        self.sent.read().await.clone()
    }

    /// Messages deleted so far, including failed attempts.
    pub async fn deleted_messages(&self) -> Vec<MessageRef> {
        self.deleted.read().await.clone()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_document(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
    ) -> Result<MessageRef, SourceError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SourceError::Forbidden("bot was kicked from the chat".into()));
        }
        if !path.exists() {
            return Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let message = MessageRef {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
        };
        self.sent.write().await.push(SentDocument {
            message,
            path: path.to_path_buf(),
            caption: caption.to_string(),
        });
        Ok(message)
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), SourceError> {
        self.deleted.write().await.push(*message);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(SourceError::Api {
                status: 400,
                description: "Bad Request: message to delete not found".into(),
            });
        }
        Ok(())
    }
}
