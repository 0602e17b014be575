use std::path::PathBuf;

use thiserror::Error;

/// Result type used by the scrubber crate.
pub type Result<T> = std::result::Result<T, ScrubberError>;

/// Errors produced by the scrubber core.
///
/// Extraction errors are absorbed by the thumbnail generator and only ever
/// surface through logs; the remaining variants reach hosts that load
/// configuration or drive the screen runtime.
#[derive(Debug, Error)]
pub enum ScrubberError {
    #[error("thumbnail extraction failed at {timestamp_ms}ms: {reason}")]
    Extraction { timestamp_ms: u64, reason: String },

    #[error("thumbnail extraction task failed: {0}")]
    ExtractionTask(#[from] tokio::task::JoinError),

    #[error("invalid media duration: {0}")]
    InvalidDuration(f64),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("{context}: {} ({source})", .path.display())]
    ConfigIo {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse failed at {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config serialization failed: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("screen runtime is closed")]
    ScreenClosed,

    #[error("media backend error: {0}")]
    Media(#[from] media_ffmpeg::MediaFfmpegError),
}

impl ScrubberError {
    /// Builds an extraction error for hosts implementing their own extractor.
    pub fn extraction(timestamp_ms: u64, reason: impl Into<String>) -> Self {
        Self::Extraction {
            timestamp_ms,
            reason: reason.into(),
        }
    }
}
