use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::debug;

use crate::thumbnail::{MediaReference, ThumbnailSequence};
use crate::time::MediaDuration;

/// Number of thumbnail strips kept per process.
pub const DEFAULT_THUMBNAIL_CACHE_CAPACITY: usize = 5;

/// Cache key: media plus its duration rounded to whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbnailCacheKey {
    media: MediaReference,
    duration_secs: u64,
}

impl ThumbnailCacheKey {
    pub fn new(media: MediaReference, duration: MediaDuration) -> Self {
        Self {
            media,
            duration_secs: duration.cache_bucket_secs(),
        }
    }

    pub fn media(&self) -> &MediaReference {
        &self.media
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }
}

/// Bounded map of thumbnail strips with first-in-first-out eviction.
///
/// Reads never refresh an entry; once the cache is full, inserting a new key
/// drops the entry that was inserted earliest.
///
/// # Example
/// ```
/// use scrubber::cache::{ThumbnailCache, ThumbnailCacheKey};
/// use scrubber::{MediaDuration, MediaReference, ThumbnailSequence};
///
/// let mut cache = ThumbnailCache::new(5);
/// let key = ThumbnailCacheKey::new(
///     MediaReference::from("demo.mp4"),
///     MediaDuration::new(99.6).expect("valid"),
/// );
/// cache.set(key.clone(), ThumbnailSequence::absent(10));
///
/// assert_eq!(key.duration_secs(), 100);
/// assert!(cache.get(&key).is_some());
/// ```
#[derive(Debug)]
pub struct ThumbnailCache {
    capacity: usize,
    entries: HashMap<ThumbnailCacheKey, ThumbnailSequence>,
    insertion_order: VecDeque<ThumbnailCacheKey>,
}

impl ThumbnailCache {
    /// Creates a thumbnail cache.
    ///
    /// `capacity` must be positive.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "thumbnail cache capacity must be positive");
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            insertion_order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ThumbnailCacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns a copy of the cached strip.
    pub fn get(&self, key: &ThumbnailCacheKey) -> Option<ThumbnailSequence> {
        self.entries.get(key).cloned()
    }

    /// Inserts a strip, evicting the earliest-inserted entry when full.
    ///
    /// Replacing the value of an existing key keeps its original insertion
    /// position and evicts nothing.
    pub fn set(&mut self, key: ThumbnailCacheKey, sequence: ThumbnailSequence) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = sequence;
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.insertion_order.push_back(key.clone());
        self.entries.insert(key, sequence);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    fn evict_oldest(&mut self) {
        let Some(oldest) = self.insertion_order.pop_front() else {
            return;
        };
        let _ = self.entries.remove(&oldest);
        debug!(
            media = %oldest.media,
            duration_secs = oldest.duration_secs,
            "thumbnail cache evicted oldest entry"
        );
    }
}

/// Cloneable handle to one [`ThumbnailCache`] shared across screens.
#[derive(Debug, Clone)]
pub struct SharedThumbnailCache {
    inner: Arc<Mutex<ThumbnailCache>>,
}

impl SharedThumbnailCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ThumbnailCache::new(capacity))),
        }
    }

    /// The process-wide cache, created empty on first use and kept for the
    /// process lifetime.
    pub fn process_wide() -> Self {
        static PROCESS_CACHE: OnceLock<SharedThumbnailCache> = OnceLock::new();
        PROCESS_CACHE
            .get_or_init(|| Self::new(DEFAULT_THUMBNAIL_CACHE_CAPACITY))
            .clone()
    }

    pub fn get(&self, key: &ThumbnailCacheKey) -> Option<ThumbnailSequence> {
        self.lock().get(key)
    }

    pub fn set(&self, key: ThumbnailCacheKey, sequence: ThumbnailSequence) {
        self.lock().set(key, sequence);
    }

    /// Stores `sequence` only if `admit` still holds with the cache locked.
    /// Returns whether the strip was stored.
    pub fn set_if(
        &self,
        key: ThumbnailCacheKey,
        sequence: ThumbnailSequence,
        admit: impl FnOnce() -> bool,
    ) -> bool {
        let mut cache = self.lock();
        if !admit() {
            return false;
        }
        cache.set(key, sequence);
        true
    }

    /// Runs `f` with the cache locked, ordering it against [`Self::set_if`].
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock();
        f()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, ThumbnailCache> {
        // Every mutation leaves the map consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedThumbnailCache {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_CACHE_CAPACITY)
    }
}
