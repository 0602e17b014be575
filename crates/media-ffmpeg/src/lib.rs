mod decode;
mod error;
mod probe;
mod time;

pub use decode::{DecodedThumbnail, ScaleQuality, decode_thumbnail_near_seconds};
pub use error::{MediaFfmpegError, Result};
pub use probe::{MediaInfo, StreamInfo, StreamKind, probe_media};
pub use time::Rational;
