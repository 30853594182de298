//! In-memory LRU cache of sticker set metadata.
//!
//! Only set listings are cached; asset bytes are always fetched fresh.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::source::{SourceError, StickerSet, StickerSource};

/// Cache hit statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

/// Bounded cache of `StickerSet`s keyed by set name.
pub struct SetCache {
    sets: Mutex<LruCache<String, Arc<StickerSet>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SetCache {
    /// Creates a cache holding at most `capacity` sets (at least one).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sets: Mutex::new(LruCache::new(cap)),
            capacity: cap.get(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached set, or looks it up through `source` and caches it.
    ///
    /// Lookup errors are not cached.
    pub async fn get_or_fetch(
        &self,
        source: &dyn StickerSource,
        name: &str,
    ) -> Result<Arc<StickerSet>, SourceError> {
        if let Some(set) = self.sets.lock().await.get(name).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(set);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(set = name, source = source.name(), "Sticker set cache miss");

        // The lock is not held across the lookup; concurrent misses may both fetch.
        let set = Arc::new(source.get_sticker_set(name).await?);
        self.sets.lock().await.put(name.to_string(), set.clone());
        Ok(set)
    }

    /// Drops a cached set so the next lookup refetches it.
    pub async fn invalidate(&self, name: &str) -> bool {
        self.sets.lock().await.pop(name).is_some()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.sets.lock().await.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockStickerSource};

    #[tokio::test]
    async fn test_second_lookup_is_a_hit() {
        let source = MockStickerSource::new();
        source.add_set(fixtures::sticker_set("cats", 2)).await;
        let cache = SetCache::new(4);

        let a = cache.get_or_fetch(&source, "cats").await.unwrap();
        let b = cache.get_or_fetch(&source, "cats").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(source.set_lookups(), 1);
        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let source = MockStickerSource::new();
        for name in ["a", "b", "c"] {
            source.add_set(fixtures::sticker_set(name, 1)).await;
        }
        let cache = SetCache::new(2);

        cache.get_or_fetch(&source, "a").await.unwrap();
        cache.get_or_fetch(&source, "b").await.unwrap();
        cache.get_or_fetch(&source, "a").await.unwrap();
        cache.get_or_fetch(&source, "c").await.unwrap(); // evicts b
        assert_eq!(source.set_lookups(), 3);

        cache.get_or_fetch(&source, "a").await.unwrap();
        assert_eq!(source.set_lookups(), 3);
        cache.get_or_fetch(&source, "b").await.unwrap();
        assert_eq!(source.set_lookups(), 4);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let source = MockStickerSource::new();
        let cache = SetCache::new(2);

        assert!(cache.get_or_fetch(&source, "dogs").await.is_err());
        source.add_set(fixtures::sticker_set("dogs", 1)).await;
        assert!(cache.get_or_fetch(&source, "dogs").await.is_ok());
        assert_eq!(source.set_lookups(), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let source = MockStickerSource::new();
        source.add_set(fixtures::sticker_set("cats", 1)).await;
        let cache = SetCache::new(2);

        cache.get_or_fetch(&source, "cats").await.unwrap();
        assert!(cache.invalidate("cats").await);
        assert!(!cache.invalidate("cats").await);
        cache.get_or_fetch(&source, "cats").await.unwrap();
        assert_eq!(source.set_lookups(), 2);
    }
}
