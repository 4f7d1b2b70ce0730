//! Time-of-day parsing and the interval overlap test.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static TIME_OF_DAY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid time format: {0}")]
pub struct TimeParseError(pub String);

/// Parses `HH:MM` into minutes since midnight.
pub fn parse_time_of_day(value: &str) -> Result<u16, TimeParseError> {
    let trimmed = value.trim();
    let caps = TIME_OF_DAY_REGEX
        .captures(trimmed)
        .ok_or_else(|| TimeParseError(value.to_string()))?;

    let hours: u16 = caps[1].parse().map_err(|_| TimeParseError(value.to_string()))?;
    let minutes: u16 = caps[2].parse().map_err(|_| TimeParseError(value.to_string()))?;
    if hours > 23 || minutes > 59 {
        return Err(TimeParseError(value.to_string()));
    }
    Ok(hours * 60 + minutes)
}

/// Formats minutes since midnight as zero-padded `HH:MM`.
pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Whether `[a_start, a_end)` and `[b_start, b_end)` share any minute.
///
/// Touching intervals (one ends exactly when the other starts) do not overlap.
pub fn overlaps(a_start: u16, a_end: u16, b_start: u16, b_end: u16) -> bool {
    a_start.max(b_start) < a_end.min(b_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("00:00"), Ok(0));
        assert_eq!(parse_time_of_day("09:30"), Ok(570));
        assert_eq!(parse_time_of_day("9:05"), Ok(545));
        assert_eq!(parse_time_of_day("23:59"), Ok(1439));
    }

    #[test]
    fn test_parse_time_of_day_rejects_garbage() {
        for bad in ["24:00", "12:60", "noon", "12", "12:5", "1200", "-1:00", ""] {
            assert_eq!(
                parse_time_of_day(bad),
                Err(TimeParseError(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(545), "09:05");
        assert_eq!(format_minutes(0), "00:00");
    }

    #[test]
    fn test_overlaps() {
        // 09:00-10:00 vs 09:30-10:30
        assert!(overlaps(540, 600, 570, 630));
        // containment
        assert!(overlaps(540, 720, 600, 630));
        // identical
        assert!(overlaps(540, 600, 540, 600));
        // disjoint
        assert!(!overlaps(540, 600, 660, 720));
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        // 09:00-10:00 then 10:00-11:00
        assert!(!overlaps(540, 600, 600, 660));
        assert!(!overlaps(600, 660, 540, 600));
    }
}
