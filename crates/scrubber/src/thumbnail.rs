use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use media_ffmpeg::ScaleQuality;
use tracing::trace;

use crate::error::Result;
use crate::time::MediaDuration;

/// Opaque identifier of a video source (path or URI).
///
/// Immutable for the life of a screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaReference(Arc<str>);

impl MediaReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(Arc::from(uri.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path for `file://` URIs and bare paths.
    pub fn to_path(&self) -> PathBuf {
        let uri = self.as_str();
        PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
    }
}

impl Display for MediaReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for MediaReference {
    fn from(value: &Path) -> Self {
        Self::new(value.to_string_lossy().into_owned())
    }
}

/// Pixel format for thumbnails passed to the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailPixelFormat {
    Rgba8,
}

/// Immutable image handle for one extracted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailImage {
    pub width: u32,
    pub height: u32,
    pub format: ThumbnailPixelFormat,
    pub bytes: Arc<[u8]>,
}

/// Requested thumbnail pixel size and encode quality (1..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailQuality {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl ThumbnailQuality {
    fn scale_quality(self) -> ScaleQuality {
        match self.quality {
            0..=33 => ScaleQuality::Fast,
            34..=66 => ScaleQuality::Balanced,
            _ => ScaleQuality::High,
        }
    }
}

/// One slot of the strip: an image, or absent when not generated or failed.
pub type ThumbnailSlot = Option<ThumbnailImage>;

/// Ordered strip of exactly `N` slots; slot `i` shows the frame at
/// `(duration / N) * i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSequence {
    slots: Vec<ThumbnailSlot>,
}

impl ThumbnailSequence {
    /// Sequence of `count` absent slots.
    pub fn absent(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ThumbnailSlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&ThumbnailImage> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_all_absent(&self) -> bool {
        self.present_count() == 0
    }

    /// Writes `image` into slot `index`; out-of-range indices are ignored so
    /// the length never changes.
    pub(crate) fn fill(&mut self, index: usize, image: ThumbnailImage) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(image);
        }
    }
}

/// Sample timestamps in seconds: `t_i = (duration / count) * i` for `i` in `[0, count)`.
///
/// # Example
/// ```
/// use scrubber::MediaDuration;
/// use scrubber::thumbnail::sample_timestamps;
///
/// let duration = MediaDuration::new(100.0).expect("valid");
/// assert_eq!(sample_timestamps(duration, 4), vec![0.0, 25.0, 50.0, 75.0]);
/// ```
pub fn sample_timestamps(duration: MediaDuration, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    let step = duration.as_secs() / count as f64;
    (0..count).map(|index| step * index as f64).collect()
}

/// Asynchronous frame extraction primitive.
#[async_trait]
pub trait ThumbnailExtractor: Send + Sync {
    /// Extracts the frame at `timestamp_ms`, scaled per `quality`.
    async fn extract(
        &self,
        media: &MediaReference,
        timestamp_ms: u64,
        quality: ThumbnailQuality,
    ) -> Result<ThumbnailImage>;
}

/// FFmpeg CLI-backed extractor used by production wiring.
///
/// Each call runs on tokio's blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegThumbnailExtractor;

#[async_trait]
impl ThumbnailExtractor for FfmpegThumbnailExtractor {
    async fn extract(
        &self,
        media: &MediaReference,
        timestamp_ms: u64,
        quality: ThumbnailQuality,
    ) -> Result<ThumbnailImage> {
        let path = media.to_path();
        trace!(media = %media, timestamp_ms, "ffmpeg thumbnail extraction");
        let decoded = tokio::task::spawn_blocking(move || {
            media_ffmpeg::decode_thumbnail_near_seconds(
                &path,
                timestamp_ms as f64 / 1_000.0,
                quality.width,
                quality.height,
                quality.scale_quality(),
            )
        })
        .await??;

        Ok(ThumbnailImage {
            width: decoded.width,
            height: decoded.height,
            format: ThumbnailPixelFormat::Rgba8,
            bytes: decoded.rgba.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        MediaReference, ThumbnailImage, ThumbnailPixelFormat, ThumbnailQuality,
        ThumbnailSequence, sample_timestamps,
    };
    use crate::time::MediaDuration;
    use media_ffmpeg::ScaleQuality;

    #[test]
    fn hundred_seconds_in_ten_slots_samples_every_ten_seconds() {
        let duration = MediaDuration::new(100.0).expect("valid duration");
        let timestamps = sample_timestamps(duration, 10);

        let expected: Vec<f64> = (0..10).map(|i| f64::from(i) * 10.0).collect();
        assert_eq!(timestamps, expected);
    }

    #[test]
    fn zero_count_yields_no_samples() {
        let duration = MediaDuration::new(100.0).expect("valid duration");
        assert!(sample_timestamps(duration, 0).is_empty());
    }

    #[test]
    fn fill_out_of_range_keeps_length() {
        let mut sequence = ThumbnailSequence::absent(3);
        sequence.fill(7, sample_image());
        sequence.fill(1, sample_image());

        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.present_count(), 1);
        assert!(sequence.get(1).is_some());
    }

    #[test]
    fn file_uri_maps_to_local_path() {
        let media = MediaReference::from("file:///tmp/clip.mp4");
        assert_eq!(media.to_path(), std::path::PathBuf::from("/tmp/clip.mp4"));
    }

    #[test]
    fn quality_buckets_map_to_scalers() {
        let quality = |quality| ThumbnailQuality {
            width: 64,
            height: 36,
            quality,
        };
        assert_eq!(quality(10).scale_quality(), ScaleQuality::Fast);
        assert_eq!(quality(50).scale_quality(), ScaleQuality::Balanced);
        assert_eq!(quality(90).scale_quality(), ScaleQuality::High);
    }

    fn sample_image() -> ThumbnailImage {
        ThumbnailImage {
            width: 1,
            height: 1,
            format: ThumbnailPixelFormat::Rgba8,
            bytes: Arc::from(vec![0; 4]),
        }
    }
}
