use thiserror::Error;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, MediaFfmpegError>;

/// Error type for media probing/decoding operations backed by FFmpeg CLI tools.
#[derive(Debug, Error)]
pub enum MediaFfmpegError {
    #[error("invalid rational {num}/{den}")]
    InvalidRational { num: i32, den: i32 },

    #[error("invalid timestamp seconds: {0}")]
    InvalidTimestampSeconds(f64),

    #[error("invalid thumbnail size {width}x{height}")]
    InvalidThumbnailSize { width: u32, height: u32 },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed ({status}): {command}; stderr: {}", .stderr.trim())]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("utf8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("parse error ({context}): {value}")]
    Parse {
        context: &'static str,
        value: String,
    },
}
