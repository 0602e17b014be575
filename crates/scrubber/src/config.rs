//! Host tuning for the scrubber, stored as TOML.
//!
//! Thumbnail count, concurrency and pixel size are picked per [`DeviceTier`]
//! by the host; the generator never inspects device capability itself.
//!
//! # Examples
//!
//! ```no_run
//! use scrubber::config::{self, DeviceTier, ScrubberConfig};
//! use std::path::Path;
//!
//! let path = Path::new("./scrubber.toml");
//! let mut config = config::load_from_path(path).unwrap_or_default();
//! config.apply_tier(DeviceTier::Low);
//! config::save_to_path(&config, path).expect("failed to save config");
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DEFAULT_THUMBNAIL_CACHE_CAPACITY;
use crate::error::{Result, ScrubberError};
use crate::generator::GenerationRequest;
use crate::gesture::DEFAULT_TAP_SLOP_PX;
use crate::thumbnail::{MediaReference, ThumbnailQuality};
use crate::time::MediaDuration;

pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 50;
pub const DEFAULT_PLAYHEAD_WIDTH_PX: f64 = 4.0;
pub const DEFAULT_LABEL_FADE_MS: u64 = 150;

/// Device capability class the host selects presets by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTier {
    Low,
    #[default]
    Standard,
}

impl DeviceTier {
    pub fn thumbnail_count(self) -> usize {
        match self {
            Self::Low => 6,
            Self::Standard => 10,
        }
    }

    pub fn concurrency_limit(self) -> usize {
        match self {
            Self::Low => 2,
            Self::Standard => 3,
        }
    }

    pub fn thumbnail_size(self) -> (u32, u32) {
        match self {
            Self::Low => (64, 36),
            Self::Standard => (120, 68),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubberConfig {
    pub thumbnail_count: usize,
    pub concurrency_limit: usize,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub thumbnail_quality: u8,
    pub cache_capacity: usize,
    pub tap_slop_px: f64,
    pub playhead_width_px: f64,
    pub label_fade_ms: u64,
}

impl Default for ScrubberConfig {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Standard)
    }
}

impl ScrubberConfig {
    pub fn for_tier(tier: DeviceTier) -> Self {
        let (thumbnail_width, thumbnail_height) = tier.thumbnail_size();
        Self {
            thumbnail_count: tier.thumbnail_count(),
            concurrency_limit: tier.concurrency_limit(),
            thumbnail_width,
            thumbnail_height,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            cache_capacity: DEFAULT_THUMBNAIL_CACHE_CAPACITY,
            tap_slop_px: DEFAULT_TAP_SLOP_PX,
            playhead_width_px: DEFAULT_PLAYHEAD_WIDTH_PX,
            label_fade_ms: DEFAULT_LABEL_FADE_MS,
        }
    }

    /// Overwrites the tier-dependent fields, leaving the rest untouched.
    pub fn apply_tier(&mut self, tier: DeviceTier) {
        let (width, height) = tier.thumbnail_size();
        self.thumbnail_count = tier.thumbnail_count();
        self.concurrency_limit = tier.concurrency_limit();
        self.thumbnail_width = width;
        self.thumbnail_height = height;
    }

    pub fn thumbnail_quality(&self) -> ThumbnailQuality {
        ThumbnailQuality {
            width: self.thumbnail_width,
            height: self.thumbnail_height,
            quality: self.thumbnail_quality,
        }
    }

    pub fn generation_request(
        &self,
        media: MediaReference,
        duration: MediaDuration,
    ) -> GenerationRequest {
        GenerationRequest {
            media,
            duration,
            count: self.thumbnail_count,
            concurrency_limit: self.concurrency_limit,
            quality: self.thumbnail_quality(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_count == 0 {
            return Err(invalid("thumbnail_count must be at least 1"));
        }
        if self.concurrency_limit == 0 {
            return Err(invalid("concurrency_limit must be at least 1"));
        }
        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err(invalid(format!(
                "thumbnail size must be non-zero, got {}x{}",
                self.thumbnail_width, self.thumbnail_height
            )));
        }
        if !(1..=100).contains(&self.thumbnail_quality) {
            return Err(invalid(format!(
                "thumbnail_quality must be in 1..=100, got {}",
                self.thumbnail_quality
            )));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("cache_capacity must be at least 1"));
        }
        if !self.tap_slop_px.is_finite() || self.tap_slop_px < 0.0 {
            return Err(invalid("tap_slop_px must be a non-negative number"));
        }
        if !self.playhead_width_px.is_finite() || self.playhead_width_px < 0.0 {
            return Err(invalid("playhead_width_px must be a non-negative number"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ScrubberError {
    ScrubberError::InvalidConfig {
        reason: reason.into(),
    }
}

/// Loads and validates a config file. A missing file yields the defaults.
pub fn load_from_path(path: &Path) -> Result<ScrubberConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) if source.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found; using defaults");
            return Ok(ScrubberConfig::default());
        }
        Err(source) => {
            return Err(ScrubberError::ConfigIo {
                context: "failed to read config",
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let config: ScrubberConfig =
        toml::from_str(&content).map_err(|source| ScrubberError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

pub fn save_to_path(config: &ScrubberConfig, path: &Path) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ScrubberError::ConfigIo {
            context: "failed to create config directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content).map_err(|source| ScrubberError::ConfigIo {
        context: "failed to write config",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_tier_settings() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("nested").join("scrubber.toml");
        let config = ScrubberConfig::for_tier(DeviceTier::Low);

        save_to_path(&config, &path).expect("failed to save config");
        let loaded = load_from_path(&path).expect("failed to load config");

        assert_eq!(loaded, config);
        assert_eq!(loaded.thumbnail_count, 6);
        assert_eq!(loaded.concurrency_limit, 2);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let loaded = load_from_path(&temp_dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(loaded, ScrubberConfig::default());
    }

    #[test]
    fn missing_fields_fall_back_to_standard_preset() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("scrubber.toml");
        fs::write(&path, "thumbnail_count = 4\n").expect("failed to write config");

        let loaded = load_from_path(&path).expect("failed to load config");

        assert_eq!(loaded.thumbnail_count, 4);
        assert_eq!(loaded.concurrency_limit, 3);
        assert_eq!((loaded.thumbnail_width, loaded.thumbnail_height), (120, 68));
        assert_eq!(loaded.cache_capacity, 5);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("scrubber.toml");
        fs::write(&path, "not = valid = toml").expect("failed to write config");

        assert!(matches!(
            load_from_path(&path),
            Err(ScrubberError::ConfigParse { .. })
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let base = ScrubberConfig::default();
        assert!(base.validate().is_ok());

        let cases = [
            ScrubberConfig { thumbnail_count: 0, ..base.clone() },
            ScrubberConfig { concurrency_limit: 0, ..base.clone() },
            ScrubberConfig { thumbnail_width: 0, ..base.clone() },
            ScrubberConfig { thumbnail_quality: 0, ..base.clone() },
            ScrubberConfig { thumbnail_quality: 101, ..base.clone() },
            ScrubberConfig { cache_capacity: 0, ..base.clone() },
            ScrubberConfig { tap_slop_px: -1.0, ..base.clone() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ScrubberError::InvalidConfig { .. })),
                "expected rejection for {config:?}"
            );
        }
    }

    #[test]
    fn generation_request_carries_tier_tuning() {
        let mut config = ScrubberConfig::default();
        config.apply_tier(DeviceTier::Low);
        let duration = MediaDuration::new(30.0).expect("valid");

        let request = config.generation_request(MediaReference::new("clip.mp4"), duration);

        assert_eq!(request.count, 6);
        assert_eq!(request.concurrency_limit, 2);
        assert_eq!((request.quality.width, request.quality.height), (64, 36));
    }
}
