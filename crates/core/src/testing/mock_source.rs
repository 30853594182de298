//! Mock sticker source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::source::{SourceError, StickerSet, StickerSource};

/// Mock implementation of the StickerSource trait.
///
/// Provides controllable behavior for testing:
/// - Serve sticker sets and file contents from memory
/// - Script failures per file id, either a fixed sequence or forever
/// - Count download attempts per file id
/// - Track how many downloads run at once
///
/// Clones share all state.
///
/// # Example
///
/// ```rust,ignore
/// use stickerpack_core::testing::MockStickerSource;
///
/// let source = MockStickerSource::new();
/// source.add_file("file-1", webp_bytes()).await;
/// source.fail_next("file-1", vec![SourceError::Timeout]).await;
///
/// // first attempt times out, second succeeds
/// assert_eq!(source.download_attempts("file-1").await, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockStickerSource {
    sets: Arc<RwLock<HashMap<String, StickerSet>>>,
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Errors returned, in order, before the file is served.
    scripted_failures: Arc<RwLock<HashMap<String, VecDeque<SourceError>>>>,
    /// Files that fail on every attempt.
    permanent_failures: Arc<RwLock<HashMap<String, fn() -> SourceError>>>,
    attempts: Arc<RwLock<HashMap<String, u32>>>,
    set_lookups: Arc<AtomicUsize>,
    delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter even if the download is cancelled.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockStickerSource {
    /// Create a new mock source with no sets or files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sticker set.
    pub async fn add_set(&self, set: StickerSet) {
        self.sets.write().await.insert(set.name.clone(), set);
    }

    /// Register the bytes served for a file id.
    pub async fn add_file(&self, file_id: &str, bytes: Vec<u8>) {
        self.files.write().await.insert(file_id.to_string(), bytes);
    }

    /// Fail the next downloads of `file_id` with these errors, in order.
    pub async fn fail_next(&self, file_id: &str, errors: Vec<SourceError>) {
        self.scripted_failures
            .write()
            .await
            .insert(file_id.to_string(), errors.into());
    }

    /// Fail every download of `file_id` with a fresh error from `make`.
    pub async fn fail_always(&self, file_id: &str, make: fn() -> SourceError) {
        self.permanent_failures
            .write()
            .await
            .insert(file_id.to_string(), make);
    }

    /// Delay every download by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Download attempts made for `file_id`.
    pub async fn download_attempts(&self, file_id: &str) -> u32 {
        self.attempts.read().await.get(file_id).copied().unwrap_or(0)
    }

    /// Download attempts across all files.
    pub async fn total_download_attempts(&self) -> u32 {
        self.attempts.read().await.values().sum()
    }

    /// Number of `get_sticker_set` calls.
    pub fn set_lookups(&self) -> usize {
        self.set_lookups.load(Ordering::SeqCst)
    }

    /// Highest number of downloads observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Downloads running right now.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StickerSource for MockStickerSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_sticker_set(&self, name: &str) -> Result<StickerSet, SourceError> {
        self.set_lookups.fetch_add(1, Ordering::SeqCst);
        self.sets
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("sticker set {} not found", name)))
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, SourceError> {
        *self
            .attempts
            .write()
            .await
            .entry(file_id.to_string())
            .or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(self.in_flight.clone());
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(queue) = self.scripted_failures.write().await.get_mut(file_id) {
            if let Some(err) = queue.pop_front() {
                return Err(err);
            }
        }

        if let Some(make) = self.permanent_failures.read().await.get(file_id) {
            return Err(make());
        }

        let bytes = self
            .files
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("file {} not found", file_id)))?;

        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_serves_files_and_counts_attempts() {
        let dir = TempDir::new().unwrap();
        let source = MockStickerSource::new();
        source.add_file("f", vec![1, 2, 3]).await;
        source.fail_next("f", vec![SourceError::Timeout]).await;

        let dest = dir.path().join("f.bin");
        assert!(source.download("f", &dest).await.is_err());
        assert_eq!(source.download("f", &dest).await.unwrap(), 3);
        assert_eq!(source.download_attempts("f").await, 2);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = MockStickerSource::new();
        let err = source
            .download("missing", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_sets() {
        let source = MockStickerSource::new();
        source.add_set(fixtures::sticker_set("cats", 3)).await;

        let set = source.get_sticker_set("cats").await.unwrap();
        assert_eq!(set.stickers.len(), 3);
        assert!(source.get_sticker_set("dogs").await.is_err());
        assert_eq!(source.set_lookups(), 2);
    }
}
