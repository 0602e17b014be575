//! Bounded-concurrency thumbnail strip generation with epoch cancellation.
//!
//! A [`ThumbnailGenerator`] hands out one [`GenerationToken`] per run. Starting
//! a run (or cancelling) bumps the generator's active epoch, which invalidates
//! every older token. A run checks its token after each extraction resolves
//! and before touching the cache, so a superseded run never publishes
//! anything, whatever order the runs finish in.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::cache::{SharedThumbnailCache, ThumbnailCacheKey};
use crate::thumbnail::{
    MediaReference, ThumbnailExtractor, ThumbnailQuality, ThumbnailSequence, sample_timestamps,
};
use crate::time::{MediaDuration, seconds_to_millis};

/// Inputs of one generation run. Count, concurrency and pixel size are host
/// tuning, typically picked per device tier.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub media: MediaReference,
    pub duration: MediaDuration,
    pub count: usize,
    pub concurrency_limit: usize,
    pub quality: ThumbnailQuality,
}

impl GenerationRequest {
    pub fn cache_key(&self) -> ThumbnailCacheKey {
        ThumbnailCacheKey::new(self.media.clone(), self.duration)
    }
}

/// Identifies one generation run; stale once a newer run starts.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    epoch: u64,
    active: Arc<AtomicU64>,
}

impl GenerationToken {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self) -> bool {
        self.active.load(Ordering::Acquire) == self.epoch
    }
}

/// Result of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Served from the cache without extracting anything.
    Cached(ThumbnailSequence),
    /// Freshly extracted; may contain absent slots.
    Generated(ThumbnailSequence),
    /// Superseded or cancelled; nothing was published.
    Cancelled,
}

impl GenerationOutcome {
    pub fn sequence(&self) -> Option<&ThumbnailSequence> {
        match self {
            Self::Cached(sequence) | Self::Generated(sequence) => Some(sequence),
            Self::Cancelled => None,
        }
    }

    pub fn into_sequence(self) -> Option<ThumbnailSequence> {
        match self {
            Self::Cached(sequence) | Self::Generated(sequence) => Some(sequence),
            Self::Cancelled => None,
        }
    }
}

/// Produces thumbnail strips for one screen, consulting a shared cache.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    cache: SharedThumbnailCache,
    active: Arc<AtomicU64>,
}

impl ThumbnailGenerator {
    pub fn new(cache: SharedThumbnailCache) -> Self {
        Self {
            cache,
            active: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cache(&self) -> &SharedThumbnailCache {
        &self.cache
    }

    /// Starts a new run, cancelling the predecessor.
    pub fn begin(&self) -> GenerationToken {
        let epoch = self.bump_epoch() + 1;
        GenerationToken {
            epoch,
            active: Arc::clone(&self.active),
        }
    }

    /// Cancels the active run without starting another.
    pub fn cancel(&self) {
        let cancelled = self.bump_epoch();
        debug!(epoch = cancelled, "thumbnail generation cancelled");
    }

    /// Once this returns, no run holding an older token can write the cache.
    fn bump_epoch(&self) -> u64 {
        self.cache.exclusive(|| self.active.fetch_add(1, Ordering::AcqRel))
    }

    /// Returns the cached strip for `request`, if any.
    pub fn lookup(&self, request: &GenerationRequest) -> Option<ThumbnailSequence> {
        self.cache.get(&request.cache_key())
    }

    /// Runs one generation for `token`.
    ///
    /// Extraction calls are admitted through a sliding window of
    /// `concurrency_limit`: a new call starts as soon as any in-flight call
    /// resolves. Failed calls leave their slot absent. Results land in their
    /// sample index regardless of completion order. A strip with at least one
    /// image is written to the cache; an all-absent strip is not.
    pub async fn generate<X>(
        &self,
        token: &GenerationToken,
        extractor: &X,
        request: &GenerationRequest,
    ) -> GenerationOutcome
    where
        X: ThumbnailExtractor + ?Sized,
    {
        if !token.is_current() {
            return GenerationOutcome::Cancelled;
        }

        let key = request.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!(
                media = %request.media,
                duration_secs = key.duration_secs(),
                epoch = token.epoch(),
                "thumbnail cache hit"
            );
            return GenerationOutcome::Cached(cached);
        }
        debug!(
            media = %request.media,
            duration_secs = key.duration_secs(),
            count = request.count,
            concurrency_limit = request.concurrency_limit,
            epoch = token.epoch(),
            "thumbnail cache miss"
        );

        let media = &request.media;
        let quality = request.quality;
        let mut sequence = ThumbnailSequence::absent(request.count);
        let mut completions = stream::iter(
            sample_timestamps(request.duration, request.count)
                .into_iter()
                .enumerate(),
        )
        .map(|(index, seconds)| {
            let timestamp_ms = seconds_to_millis(seconds);
            async move {
                let result = extractor.extract(media, timestamp_ms, quality).await;
                (index, timestamp_ms, result)
            }
        })
        .buffer_unordered(request.concurrency_limit.max(1));

        while let Some((index, timestamp_ms, result)) = completions.next().await {
            if !token.is_current() {
                debug!(
                    media = %request.media,
                    epoch = token.epoch(),
                    index,
                    "discarding thumbnail from superseded run"
                );
                return GenerationOutcome::Cancelled;
            }
            match result {
                Ok(image) => sequence.fill(index, image),
                Err(error) => {
                    debug!(
                        media = %request.media,
                        index,
                        timestamp_ms,
                        %error,
                        "thumbnail extraction failed"
                    );
                }
            }
        }
        drop(completions);

        if !token.is_current() {
            return GenerationOutcome::Cancelled;
        }

        let present = sequence.present_count();
        let absent = sequence.len() - present;
        if present == 0 {
            warn!(
                media = %request.media,
                count = sequence.len(),
                epoch = token.epoch(),
                "thumbnail generation produced no images; not caching"
            );
        } else if !self.cache.set_if(key, sequence.clone(), || token.is_current()) {
            debug!(
                media = %request.media,
                epoch = token.epoch(),
                "run superseded before its strip was cached"
            );
            return GenerationOutcome::Cancelled;
        } else {
            info!(
                media = %request.media,
                present,
                absent,
                epoch = token.epoch(),
                "thumbnail generation finished"
            );
        }

        GenerationOutcome::Generated(sequence)
    }
}

/// A scheduled run: generator handle, token and request bundled so the
/// runtime can execute it on its own task.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    generator: ThumbnailGenerator,
    token: GenerationToken,
    request: GenerationRequest,
}

impl GenerationJob {
    pub(crate) fn new(
        generator: ThumbnailGenerator,
        token: GenerationToken,
        request: GenerationRequest,
    ) -> Self {
        Self {
            generator,
            token,
            request,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.token.epoch()
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub async fn run<X>(&self, extractor: &X) -> GenerationOutcome
    where
        X: ThumbnailExtractor + ?Sized,
    {
        self.generator
            .generate(&self.token, extractor, &self.request)
            .await
    }
}
