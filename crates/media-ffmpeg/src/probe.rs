use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use crate::error::{MediaFfmpegError, Result};
use crate::time::Rational;

const STREAM_ENTRIES: &str = "stream=index,codec_type,codec_name,time_base,width,height,duration_ts";
const FORMAT_ENTRIES: &str = "format=duration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

impl StreamKind {
    fn from_codec_type(codec_type: &str) -> Self {
        match codec_type {
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::Other,
        }
    }
}

/// One stream as reported by `ffprobe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: u32,
    pub kind: StreamKind,
    pub codec_name: Option<String>,
    pub time_base: Rational,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_ts: Option<i64>,
}

impl StreamInfo {
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_ts
            .map(|ticks| ticks as f64 * self.time_base.as_f64())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub streams: Vec<StreamInfo>,
    /// Container duration in seconds, when the container declares one.
    pub duration_seconds: Option<f64>,
}

impl MediaInfo {
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams
            .iter()
            .find(|stream| stream.kind == StreamKind::Video)
    }

    /// Container duration, else the longest stream.
    pub fn best_duration_seconds(&self) -> Option<f64> {
        self.duration_seconds.or_else(|| {
            self.streams
                .iter()
                .filter_map(StreamInfo::duration_seconds)
                .reduce(f64::max)
        })
    }
}

/// Probes streams and container duration with a single `ffprobe` run.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::probe_media;
///
/// let info = probe_media("sample.mp4").expect("probe should succeed");
/// let seconds = info.best_duration_seconds().expect("duration known");
/// assert!(seconds > 0.0);
/// ```
pub fn probe_media(path: impl AsRef<Path>) -> Result<MediaInfo> {
    let path = path.as_ref();
    let entries = format!("{STREAM_ENTRIES}:{FORMAT_ENTRIES}");

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", entries.as_str(), "-of", "compact=p=1:nk=0"])
        .arg(path)
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffprobe",
            source,
        })?;
    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffprobe -show_entries {entries} {}", path.display()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let mut info = parse_probe_output(&String::from_utf8(output.stdout)?)?;
    info.path = path.to_path_buf();
    Ok(info)
}

/// Parses `compact` output where every line starts with its section name,
/// e.g. `stream|index=0|codec_type=video|...` or `format|duration=2.000000`.
fn parse_probe_output(stdout: &str) -> Result<MediaInfo> {
    let mut streams = Vec::new();
    let mut duration_seconds = None;

    for line in stdout.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let (section, rest) = line.split_once('|').unwrap_or((line, ""));
        let fields = Fields::parse(rest)?;
        match section {
            "stream" => streams.push(fields.stream()?),
            "format" => duration_seconds = fields.optional::<f64>("duration")?,
            _ => {}
        }
    }

    if streams.is_empty() {
        return Err(MediaFfmpegError::Parse {
            context: "streams",
            value: "no streams found".to_string(),
        });
    }
    Ok(MediaInfo {
        path: PathBuf::new(),
        streams,
        duration_seconds,
    })
}

/// `key=value` pairs of one output line. `N/A` and empty values read as absent.
struct Fields<'a> {
    values: HashMap<&'a str, &'a str>,
}

impl<'a> Fields<'a> {
    fn parse(rest: &'a str) -> Result<Self> {
        let mut values = HashMap::new();
        for field in rest.split('|').filter(|field| !field.is_empty()) {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| MediaFfmpegError::Parse {
                    context: "probe field",
                    value: field.to_string(),
                })?;
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && value != "N/A" && value != "0/0" {
                values.insert(key.trim(), value);
            }
        }
        Ok(Self { values })
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        self.values.get(key).copied()
    }

    fn optional<T: FromStr>(&self, key: &'static str) -> Result<Option<T>> {
        self.raw(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| MediaFfmpegError::Parse {
                    context: key,
                    value: raw.to_string(),
                })
            })
            .transpose()
    }

    fn required<T: FromStr>(&self, key: &'static str) -> Result<T> {
        self.optional(key)?.ok_or_else(|| MediaFfmpegError::Parse {
            context: key,
            value: "missing".to_string(),
        })
    }

    fn stream(&self) -> Result<StreamInfo> {
        let codec_type = self.raw("codec_type").ok_or_else(|| MediaFfmpegError::Parse {
            context: "codec_type",
            value: "missing".to_string(),
        })?;

        Ok(StreamInfo {
            index: self.required("index")?,
            kind: StreamKind::from_codec_type(codec_type),
            codec_name: self.raw("codec_name").map(str::to_string),
            time_base: self.required::<Rational>("time_base")?,
            width: self.optional("width")?,
            height: self.optional("height")?,
            duration_ts: self.optional("duration_ts")?,
        })
    }
}
