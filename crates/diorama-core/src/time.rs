use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::error::{DioramaError, DioramaResult};

/// Span of time with sub-millisecond precision (stored as fractional seconds).
///
/// Always finite and non-negative. Deserializing a negative or non-finite
/// number of seconds fails instead of clamping.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Duration {
    /// Duration in seconds.
    seconds: f64,
}

impl Duration {
    /// Create a duration from seconds, clamping negatives (and NaN) to zero.
    pub fn from_seconds(s: f64) -> Self {
        let seconds = if s.is_nan() { 0.0 } else { s.max(0.0) };
        Self { seconds }
    }

    /// Create a duration from seconds, rejecting negative and non-finite input.
    pub fn try_from_seconds(s: f64) -> DioramaResult<Self> {
        if !s.is_finite() {
            return Err(DioramaError::InvalidTweenParameters(format!(
                "duration must be finite, got {}",
                s
            )));
        }
        if s < 0.0 {
            return Err(DioramaError::InvalidTweenParameters(format!(
                "duration must be non-negative, got {}",
                s
            )));
        }
        Ok(Self { seconds: s })
    }

    /// Create a zero duration.
    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get duration as seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0.0
    }

    /// Number of whole frames spanned at `fps`, rounded to the nearest frame.
    pub fn frame_count(&self, fps: f64) -> u64 {
        (self.seconds * fps).round() as u64
    }

    /// Convert into a std duration for use with real-time timers.
    pub fn to_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.seconds)
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::zero()
    }
}

impl TryFrom<f64> for Duration {
    type Error = DioramaError;

    fn try_from(s: f64) -> DioramaResult<Self> {
        Duration::try_from_seconds(s)
    }
}

impl From<Duration> for f64 {
    fn from(d: Duration) -> f64 {
        d.seconds
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds < 1.0 {
            write!(f, "{:.0}ms", self.seconds * 1000.0)
        } else {
            write!(f, "{:.2}s", self.seconds)
        }
    }
}

/// A point on the diorama's clock, in seconds since the clock's origin.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    seconds: f64,
}

impl Timestamp {
    /// Create a timestamp from seconds.
    pub fn from_seconds(s: f64) -> Self {
        let seconds = if s.is_nan() { 0.0 } else { s.max(0.0) };
        Self { seconds }
    }

    /// The clock origin (0.0).
    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    /// Get the time in seconds.
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn elapsed_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_seconds(self.seconds - earlier.seconds)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::zero()
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::from_seconds(self.seconds + rhs.as_seconds())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let minutes = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1_000;
        let ms = total_ms % 1_000;
        write!(f, "{:02}:{:02}.{:03}", minutes, secs, ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_seconds() {
        let d = Duration::from_seconds(2.5);
        assert!((d.as_seconds() - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_duration_clamps_negative() {
        assert!(Duration::from_seconds(-1.0).is_zero());
        assert!(Duration::from_seconds(f64::NAN).is_zero());
    }

    #[test]
    fn test_duration_try_from_rejects_bad_input() {
        assert!(Duration::try_from_seconds(-0.5).is_err());
        assert!(Duration::try_from_seconds(f64::NAN).is_err());
        assert!(Duration::try_from_seconds(f64::INFINITY).is_err());
        assert!(Duration::try_from_seconds(0.0).unwrap().is_zero());
    }

    #[test]
    fn test_duration_frame_count() {
        let d = Duration::from_seconds(1.0);
        assert_eq!(d.frame_count(60.0), 60);
        assert_eq!(Duration::from_seconds(0.1).frame_count(60.0), 6);
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(format!("{}", Duration::from_seconds(1.5)), "1.50s");
        assert_eq!(format!("{}", Duration::from_seconds(0.5)), "500ms");
    }

    #[test]
    fn test_duration_deserialize_rejects_negative() {
        let ok: Duration = serde_json::from_str("1.5").unwrap();
        assert!((ok.as_seconds() - 1.5).abs() < 1e-9);
        assert!(serde_json::from_str::<Duration>("-2.0").is_err());
    }

    #[test]
    fn test_timestamp_elapsed_since() {
        let a = Timestamp::from_seconds(3.0);
        let b = Timestamp::from_seconds(4.5);
        assert!((b.elapsed_since(a).as_seconds() - 1.5).abs() < 1e-9);
        assert!(a.elapsed_since(b).is_zero());
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::from_seconds(61.5);
        assert_eq!(format!("{}", ts), "01:01.500");
    }

    #[test]
    fn test_timestamp_add_duration() {
        let ts = Timestamp::from_seconds(1.0);
        let result = ts + Duration::from_seconds(0.5);
        assert!((result.as_seconds() - 1.5).abs() < 0.001);
    }
}
