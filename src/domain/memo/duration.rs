//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default cap on a single recording (10 minutes)
pub const DEFAULT_MAX_DURATION_SECS: u64 = 600;

/// Value object representing the length of a memo.
///
/// Stored with millisecond precision so that both the recording ticker
/// (whole seconds) and a decoded container length (fractional) fit.
/// Displays as `m:ss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Zero-length duration
    pub const ZERO: Self = Self::from_millis(0);

    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from whole seconds, saturating at `u64::MAX` ms
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs.saturating_mul(1000),
        }
    }

    /// Create a Duration from fractional seconds.
    /// Negative or non-finite input yields zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::ZERO;
        }
        Self::from_millis((secs * 1000.0).round() as u64)
    }

    /// Default maximum recording length
    pub const fn default_max_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    /// Whole seconds (truncated)
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Fractional seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.milliseconds as f64 / 1000.0
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }

    /// Short config form: `30s`, `2m`, `2m30s`
    pub fn to_config_string(&self) -> String {
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            format!("{}s", seconds)
        } else if seconds == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m{}s", minutes, seconds)
        }
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a config duration string.
    /// Supported formats: "30s", "1m", "2m30s", "90s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let invalid = || DurationParseError {
            input: s.to_string(),
        };

        let mut minutes: u64 = 0;
        let mut seconds: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;

        for ch in input.chars() {
            match ch {
                '0'..='9' => current_num.push(ch),
                'm' if !current_num.is_empty() => {
                    minutes = current_num.parse().map_err(|_| invalid())?;
                    current_num.clear();
                    found_any = true;
                }
                's' if !current_num.is_empty() => {
                    seconds = current_num.parse().map_err(|_| invalid())?;
                    current_num.clear();
                    found_any = true;
                }
                _ => return Err(invalid()),
            }
        }

        if !current_num.is_empty() || !found_any {
            return Err(invalid());
        }

        let total_secs = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .filter(|&secs| secs > 0)
            .ok_or_else(invalid)?;
        let milliseconds = total_secs.checked_mul(1000).ok_or_else(invalid)?;

        Ok(Self::from_millis(milliseconds))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        write!(f, "{}:{:02}", total_secs / 60, total_secs % 60)
    }
}

impl From<StdDuration> for Duration {
    fn from(d: StdDuration) -> Self {
        Self::from_millis(d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_minutes_and_padded_seconds() {
        assert_eq!(Duration::ZERO.to_string(), "0:00");
        assert_eq!(Duration::from_secs(3).to_string(), "0:03");
        assert_eq!(Duration::from_secs(65).to_string(), "1:05");
        assert_eq!(Duration::from_secs(600).to_string(), "10:00");
    }

    #[test]
    fn display_truncates_fraction() {
        assert_eq!(Duration::from_millis(59_999).to_string(), "0:59");
    }

    #[test]
    fn from_secs_f64_rounds_to_millis() {
        assert_eq!(Duration::from_secs_f64(2.9996).as_millis(), 3000);
        assert_eq!(Duration::from_secs_f64(1.5).as_millis(), 1500);
    }

    #[test]
    fn from_secs_f64_rejects_garbage() {
        assert_eq!(Duration::from_secs_f64(-1.0), Duration::ZERO);
        assert_eq!(Duration::from_secs_f64(f64::NAN), Duration::ZERO);
        assert_eq!(Duration::from_secs_f64(f64::INFINITY), Duration::ZERO);
    }

    #[test]
    fn parse_config_forms() {
        assert_eq!("30s".parse::<Duration>().unwrap().as_secs(), 30);
        assert_eq!("2m".parse::<Duration>().unwrap().as_secs(), 120);
        assert_eq!("2m30s".parse::<Duration>().unwrap().as_secs(), 150);
        assert_eq!("  1M30S ".parse::<Duration>().unwrap().as_secs(), 90);
    }

    #[test]
    fn parse_rejects_invalid() {
        assert!("".parse::<Duration>().is_err());
        assert!("0s".parse::<Duration>().is_err());
        assert!("30".parse::<Duration>().is_err());
        assert!("abc".parse::<Duration>().is_err());
        assert!("30x".parse::<Duration>().is_err());
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!("400000000000000000m".parse::<Duration>().is_err());
        assert!("18446744073709551615s".parse::<Duration>().is_err());
        assert!("18446744073709551616s".parse::<Duration>().is_err());
        assert!("1m18446744073709551600s".parse::<Duration>().is_err());
    }

    #[test]
    fn parse_accepts_large_but_representable() {
        let d = "1000000m".parse::<Duration>().unwrap();
        assert_eq!(d.as_secs(), 60_000_000);
    }

    #[test]
    fn from_secs_saturates() {
        assert_eq!(Duration::from_secs(u64::MAX).as_millis(), u64::MAX);
    }

    #[test]
    fn config_string() {
        assert_eq!(Duration::from_secs(30).to_config_string(), "30s");
        assert_eq!(Duration::from_secs(120).to_config_string(), "2m");
        assert_eq!(Duration::from_secs(150).to_config_string(), "2m30s");
    }

    #[test]
    fn default_max_is_ten_minutes() {
        assert_eq!(Duration::default_max_duration().as_secs(), 600);
    }
}
