use std::str::FromStr;

use crate::error::{MediaFfmpegError, Result};

/// `num/den` value such as a stream time base.
///
/// # Example
/// ```
/// use media_ffmpeg::Rational;
///
/// let time_base: Rational = "1/15360".parse().expect("valid");
/// assert_eq!(time_base.den, 15_360);
/// assert!(Rational::new(1, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub fn new(num: i32, den: i32) -> Result<Self> {
        if den <= 0 || num == 0 {
            return Err(MediaFfmpegError::InvalidRational { num, den });
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl FromStr for Rational {
    type Err = MediaFfmpegError;

    fn from_str(input: &str) -> Result<Self> {
        let parse_error = || MediaFfmpegError::Parse {
            context: "rational",
            value: input.to_string(),
        };
        let (num, den) = input.split_once('/').ok_or_else(parse_error)?;
        let num = num.trim().parse().map_err(|_| parse_error())?;
        let den = den.trim().parse().map_err(|_| parse_error())?;
        Self::new(num, den)
    }
}

#[cfg(test)]
mod tests {
    use super::Rational;

    #[test]
    fn zero_denominator_is_rejected() {
        assert!("1/0".parse::<Rational>().is_err());
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!("30".parse::<Rational>().is_err());
        assert!("a/b".parse::<Rational>().is_err());
    }

    #[test]
    fn time_base_converts_to_seconds_per_tick() {
        let time_base: Rational = "1/48000".parse().expect("valid rational");
        assert!((time_base.as_f64() - 1.0 / 48_000.0).abs() < 1e-12);
    }
}
