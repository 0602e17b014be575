use std::path::Path;
use std::process::Command;

use crate::error::{MediaFfmpegError, Result};

/// A decoded, downscaled video frame in RGBA format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedThumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Scaler used when shrinking a frame to thumbnail size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScaleQuality {
    Fast,
    #[default]
    Balanced,
    High,
}

impl ScaleQuality {
    fn sws_flags(self) -> &'static str {
        match self {
            Self::Fast => "fast_bilinear",
            Self::Balanced => "bilinear",
            Self::High => "lanczos",
        }
    }
}

/// Decodes one frame at-or-after `at_seconds` and scales it to `width`x`height`.
///
/// The seek happens on the input side, so the cost does not grow with the
/// timestamp.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::{ScaleQuality, decode_thumbnail_near_seconds};
///
/// let thumb = decode_thumbnail_near_seconds("sample.mp4", 0.5, 120, 68, ScaleQuality::Balanced)
///     .expect("decode should succeed");
/// assert_eq!(thumb.rgba.len(), 120 * 68 * 4);
/// ```
pub fn decode_thumbnail_near_seconds(
    path: impl AsRef<Path>,
    at_seconds: f64,
    width: u32,
    height: u32,
    quality: ScaleQuality,
) -> Result<DecodedThumbnail> {
    if !at_seconds.is_finite() || at_seconds < 0.0 {
        return Err(MediaFfmpegError::InvalidTimestampSeconds(at_seconds));
    }
    if width == 0 || height == 0 {
        return Err(MediaFfmpegError::InvalidThumbnailSize { width, height });
    }

    let path = path.as_ref();
    let filter = scale_filter(width, height, quality);
    let seek = format!("{at_seconds:.3}");
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-v", "error", "-ss", seek.as_str(), "-i"])
        .arg(path)
        .args(["-vf", filter.as_str(), "-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffmpeg decode thumbnail",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffmpeg decode thumbnail {}", path.display()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    // ffmpeg exits cleanly with no output when the seek lands past the last frame.
    let expected = width as usize * height as usize * 4;
    match output.stdout.len() {
        0 => {
            return Err(MediaFfmpegError::Parse {
                context: "decoded frame",
                value: format!("no frame at {at_seconds}s"),
            });
        }
        len if len != expected => {
            return Err(MediaFfmpegError::Parse {
                context: "decoded frame",
                value: format!("expected {expected} bytes, got {len}"),
            });
        }
        _ => {}
    }

    Ok(DecodedThumbnail {
        width,
        height,
        rgba: output.stdout,
    })
}

fn scale_filter(width: u32, height: u32, quality: ScaleQuality) -> String {
    format!(
        "scale={width}:{height}:flags={},format=rgba",
        quality.sws_flags()
    )
}
