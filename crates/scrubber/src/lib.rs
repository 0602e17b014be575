//! Video timeline scrubber core: thumbnail strip generation, the playback
//! position model and gesture-to-seek mapping, independent of any UI toolkit.

pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod gesture;
pub mod player;
pub mod position;
pub mod runtime;
pub mod screen;
pub mod thumbnail;
pub mod time;

pub use cache::{SharedThumbnailCache, ThumbnailCache, ThumbnailCacheKey};
pub use config::{DeviceTier, ScrubberConfig};
pub use error::{Result, ScrubberError};
pub use generator::{
    GenerationJob, GenerationOutcome, GenerationRequest, GenerationToken, ThumbnailGenerator,
};
pub use gesture::{
    GestureEvent, GestureMapper, InteractionId, PointerRecognizer, PointerSample, ScrubAction,
};
pub use player::{
    ManualPlayer, PlaybackEngine, PlayerEvent, PlayerEventHub, PlayerListener, PlayerSubscription,
};
pub use position::{PlaybackPositionModel, PositionState};
pub use runtime::{ScreenHandle, spawn_screen};
pub use screen::{ScreenEvent, ScreenMessage, ScrubberScreen, ScrubberSnapshot};
pub use thumbnail::{
    FfmpegThumbnailExtractor, MediaReference, ThumbnailExtractor, ThumbnailImage,
    ThumbnailPixelFormat, ThumbnailQuality, ThumbnailSequence, ThumbnailSlot,
};
pub use time::MediaDuration;
