use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;

use scrubber::thumbnail::sample_timestamps;
use scrubber::time::seconds_to_millis;
use scrubber::{
    GenerationOutcome, GenerationRequest, MediaDuration, MediaReference, Result, ScrubberError,
    SharedThumbnailCache, ThumbnailCache, ThumbnailCacheKey, ThumbnailExtractor, ThumbnailGenerator,
    ThumbnailImage, ThumbnailPixelFormat, ThumbnailQuality, ThumbnailSequence,
};

/// Fails on the listed timestamps; otherwise encodes the timestamp in the pixels.
struct MaskedExtractor {
    failing_ms: HashSet<u64>,
}

#[async_trait]
impl ThumbnailExtractor for MaskedExtractor {
    async fn extract(
        &self,
        _media: &MediaReference,
        timestamp_ms: u64,
        _quality: ThumbnailQuality,
    ) -> Result<ThumbnailImage> {
        for _ in 0..(timestamp_ms / 7) % 4 {
            tokio::task::yield_now().await;
        }
        if self.failing_ms.contains(&timestamp_ms) {
            return Err(ScrubberError::extraction(timestamp_ms, "masked"));
        }
        Ok(ThumbnailImage {
            width: 2,
            height: 1,
            format: ThumbnailPixelFormat::Rgba8,
            bytes: Arc::from(timestamp_ms.to_le_bytes().to_vec()),
        })
    }
}

fn decoded_timestamp(image: &ThumbnailImage) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&image.bytes);
    u64::from_le_bytes(raw)
}

fn run_generation(
    failing_mask: &[bool],
    concurrency_limit: usize,
) -> (Vec<u64>, GenerationOutcome) {
    let duration = MediaDuration::new(100.0).expect("valid duration");
    let expected_ms: Vec<u64> = sample_timestamps(duration, failing_mask.len())
        .into_iter()
        .map(seconds_to_millis)
        .collect();
    let failing_ms = expected_ms
        .iter()
        .zip(failing_mask)
        .filter_map(|(ms, &failing)| failing.then_some(*ms))
        .collect();
    let extractor = MaskedExtractor { failing_ms };
    let request = GenerationRequest {
        media: MediaReference::new("clip.mp4"),
        duration,
        count: failing_mask.len(),
        concurrency_limit,
        quality: ThumbnailQuality {
            width: 2,
            height: 1,
            quality: 50,
        },
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");
    let generator = ThumbnailGenerator::new(SharedThumbnailCache::new(5));
    let outcome = runtime.block_on(async {
        let token = generator.begin();
        generator.generate(&token, &extractor, &request).await
    });
    (expected_ms, outcome)
}

proptest! {
    #[test]
    fn strip_has_one_slot_per_sample_in_sample_order(
        failing_mask in prop::collection::vec(any::<bool>(), 1..24),
        concurrency_limit in 1usize..6,
    ) {
        let (expected_ms, outcome) = run_generation(&failing_mask, concurrency_limit);

        let GenerationOutcome::Generated(strip) = outcome else {
            return Err(TestCaseError::fail("expected a generated strip"));
        };
        prop_assert_eq!(strip.len(), failing_mask.len());
        for (index, failing) in failing_mask.iter().enumerate() {
            match strip.get(index) {
                Some(image) => {
                    prop_assert!(!failing, "slot {} should be absent", index);
                    prop_assert_eq!(decoded_timestamp(image), expected_ms[index]);
                }
                None => prop_assert!(*failing, "slot {} should be present", index),
            }
        }
    }
}

fn cache_key(n: u8) -> ThumbnailCacheKey {
    ThumbnailCacheKey::new(
        MediaReference::new(format!("clip-{n}.mp4")),
        MediaDuration::new(10.0).expect("valid duration"),
    )
}

proptest! {
    #[test]
    fn cache_keeps_the_most_recently_inserted_distinct_keys(
        capacity in 1usize..8,
        inserts in prop::collection::vec(0u8..16, 0..64),
    ) {
        let mut cache = ThumbnailCache::new(capacity);
        let mut model: VecDeque<u8> = VecDeque::new();

        for n in inserts {
            cache.set(cache_key(n), ThumbnailSequence::absent(1));
            if !model.contains(&n) {
                if model.len() == capacity {
                    model.pop_front();
                }
                model.push_back(n);
            }
        }

        prop_assert!(cache.len() <= capacity);
        prop_assert_eq!(cache.len(), model.len());
        for n in 0u8..16 {
            prop_assert_eq!(cache.contains(&cache_key(n)), model.contains(&n));
        }
    }
}
