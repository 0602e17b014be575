use crate::error::{Result, ScrubberError};

/// Known, fixed length of a media source in seconds.
///
/// Once the playback engine reports a duration it is treated as immutable for
/// the lifetime of the screen.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MediaDuration(f64);

impl MediaDuration {
    /// Validates a duration reported by the playback engine.
    ///
    /// # Example
    /// ```
    /// use scrubber::MediaDuration;
    ///
    /// let duration = MediaDuration::new(12.4).expect("valid");
    /// assert_eq!(duration.cache_bucket_secs(), 12);
    /// assert!(MediaDuration::new(f64::NAN).is_err());
    /// ```
    pub fn new(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ScrubberError::InvalidDuration(seconds));
        }
        Ok(Self(seconds))
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Whole-second bucket used in cache keys (nearest rounding).
    ///
    /// Durations jittering across a half-second boundary land in different
    /// buckets and simply miss each other's cache entry.
    pub fn cache_bucket_secs(self) -> u64 {
        self.0.round() as u64
    }

    /// Clamps `seconds` into `[0, duration]`.
    pub fn clamp(self, seconds: f64) -> f64 {
        if seconds.is_nan() {
            return 0.0;
        }
        seconds.clamp(0.0, self.0)
    }
}

/// Converts seconds to whole milliseconds, rounding to nearest.
pub fn seconds_to_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1_000.0).round() as u64
}

/// Formats a playback time as `m:ss`, or `h:mm:ss` past one hour.
///
/// # Example
/// ```
/// use scrubber::time::format_timestamp;
///
/// assert_eq!(format_timestamp(0.0), "0:00");
/// assert_eq!(format_timestamp(75.9), "1:15");
/// assert_eq!(format_timestamp(3_725.0), "1:02:05");
/// ```
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::{MediaDuration, format_timestamp, seconds_to_millis};

    #[test]
    fn negative_duration_is_rejected() {
        assert!(MediaDuration::new(-0.5).is_err());
    }

    #[test]
    fn cache_bucket_rounds_to_nearest_second() {
        assert_eq!(MediaDuration::new(99.49).expect("valid").cache_bucket_secs(), 99);
        assert_eq!(MediaDuration::new(99.5).expect("valid").cache_bucket_secs(), 100);
    }

    #[test]
    fn clamp_keeps_time_inside_duration() {
        let duration = MediaDuration::new(10.0).expect("valid");
        assert_eq!(duration.clamp(-3.0), 0.0);
        assert_eq!(duration.clamp(12.0), 10.0);
        assert_eq!(duration.clamp(f64::NAN), 0.0);
    }

    #[test]
    fn millis_round_to_nearest() {
        assert_eq!(seconds_to_millis(1.2345), 1_235);
        assert_eq!(seconds_to_millis(-1.0), 0);
    }

    #[test]
    fn timestamp_truncates_fractional_seconds() {
        assert_eq!(format_timestamp(59.99), "0:59");
        assert_eq!(format_timestamp(f64::INFINITY), "0:00");
    }
}
