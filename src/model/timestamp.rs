//! `AudioTimestamp`: a signed, millisecond-precise duration from an implicit
//! zero anchor.

use std::fmt;
use std::str::FromStr;

/// A millisecond-precise timestamp. Negative values are rejected by parsers
/// and constructors; the value is only signed internally so arithmetic
/// (e.g. `next.start - this.start`) can't underflow before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AudioTimestamp
{
    millis: i64
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampParseError
{
    #[error("empty timestamp")]
    Empty,
    #[error("invalid timestamp format: {0}")]
    InvalidFormat(String),
    #[error("negative timestamp is not allowed: {0}")]
    Negative(String)
}

impl AudioTimestamp
{
    pub const ZERO: AudioTimestamp = AudioTimestamp { millis: 0 };

    /// Construct from a millisecond count. Negative values are rejected.
    pub fn from_millis(millis: i64) -> Result<Self, TimestampParseError>
    {
        if millis < 0
        {
            return Err(TimestampParseError::Negative(millis.to_string()));
        }
        Ok(Self { millis })
    }

    /// Construct from a fractional-second count. Negative values are
    /// rejected.
    pub fn from_seconds(seconds: f64) -> Result<Self, TimestampParseError>
    {
        if seconds < 0.0
        {
            return Err(TimestampParseError::Negative(seconds.to_string()));
        }
        Self::from_millis((seconds * 1000.0).round() as i64)
    }

    /// A millisecond count that is allowed to be negative; used internally
    /// for CHAP end-time derivation math before the result is validated.
    pub fn from_millis_unchecked(millis: i64) -> Self
    {
        Self { millis }
    }

    pub fn as_millis(&self) -> i64
    {
        self.millis
    }

    pub fn as_seconds(&self) -> f64
    {
        self.millis as f64 / 1000.0
    }

    /// Parse `HH:MM:SS.mmm`, `HH:MM:SS`, or `MM:SS`.
    pub fn parse(text: &str) -> Result<Self, TimestampParseError>
    {
        let text = text.trim();
        if text.is_empty()
        {
            return Err(TimestampParseError::Empty);
        }
        if text.starts_with('-')
        {
            return Err(TimestampParseError::Negative(text.to_string()));
        }

        let (whole, frac_millis) = match text.split_once('.')
        {
            | Some((w, f)) =>
            {
                let padded = format!("{:0<3}", f);
                let ms: i64 = padded.get(0..3).unwrap_or(&padded).parse().map_err(|_| TimestampParseError::InvalidFormat(text.to_string()))?;
                (w, ms)
            }
            | None => (text, 0)
        };

        let parts: Vec<&str> = whole.split(':').collect();
        let (h, m, s): (i64, i64, i64) = match parts.as_slice()
        {
            | [hh, mm, ss] =>
            {
                let hh: i64 = hh.parse().map_err(|_| TimestampParseError::InvalidFormat(text.to_string()))?;
                let mm: i64 = mm.parse().map_err(|_| TimestampParseError::InvalidFormat(text.to_string()))?;
                let ss: i64 = ss.parse().map_err(|_| TimestampParseError::InvalidFormat(text.to_string()))?;
                (hh, mm, ss)
            }
            | [mm, ss] =>
            {
                let mm: i64 = mm.parse().map_err(|_| TimestampParseError::InvalidFormat(text.to_string()))?;
                let ss: i64 = ss.parse().map_err(|_| TimestampParseError::InvalidFormat(text.to_string()))?;
                (0, mm, ss)
            }
            | _ => return Err(TimestampParseError::InvalidFormat(text.to_string()))
        };

        let total_ms = ((h * 3600 + m * 60 + s) * 1000) + frac_millis;
        Self::from_millis(total_ms)
    }

    /// Format as canonical `HH:MM:SS.mmm`.
    pub fn format_full(&self) -> String
    {
        let total_ms = self.millis;
        let ms = total_ms % 1000;
        let total_s = total_ms / 1000;
        let s = total_s % 60;
        let total_m = total_s / 60;
        let m = total_m % 60;
        let h = total_m / 60;
        format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
    }

    /// Format as `HH:MM:SS` (no fractional part).
    pub fn format_short(&self) -> String
    {
        let total_s = self.millis / 1000;
        let s = total_s % 60;
        let total_m = total_s / 60;
        let m = total_m % 60;
        let h = total_m / 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    /// Format as `MM:SS`, folding hours into minutes.
    pub fn format_minutes_seconds(&self) -> String
    {
        let total_s = self.millis / 1000;
        let s = total_s % 60;
        let m = total_s / 60;
        format!("{:02}:{:02}", m, s)
    }
}

impl Default for AudioTimestamp
{
    fn default() -> Self
    {
        Self::ZERO
    }
}

impl fmt::Display for AudioTimestamp
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.format_full())
    }
}

impl FromStr for AudioTimestamp
{
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_full_form()
    {
        let t = AudioTimestamp::parse("01:02:03.456").unwrap();
        assert_eq!(t.as_millis(), 3723456);
    }

    #[test]
    fn parses_short_forms()
    {
        assert_eq!(AudioTimestamp::parse("01:02:03").unwrap().as_millis(), 3723000);
        assert_eq!(AudioTimestamp::parse("02:03").unwrap().as_millis(), 123000);
    }

    #[test]
    fn rejects_negative()
    {
        assert!(AudioTimestamp::parse("-00:00:01").is_err());
    }

    #[test]
    fn round_trips_at_millisecond_precision()
    {
        let t = AudioTimestamp::from_millis(123456789).unwrap();
        let formatted = t.format_full();
        let reparsed = AudioTimestamp::parse(&formatted).unwrap();
        assert_eq!(t, reparsed);
    }

    #[test]
    fn orders_numerically()
    {
        let a = AudioTimestamp::from_millis(1000).unwrap();
        let b = AudioTimestamp::from_millis(2000).unwrap();
        assert!(a < b);
    }
}
