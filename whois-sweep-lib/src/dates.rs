//! Expiration date normalization.
//!
//! WHOIS servers publish expiration timestamps in whatever format they like.
//! This module tries a fixed, ordered list of layouts and turns the first
//! match into a calendar date plus a signed day count relative to now.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::WhoisSweepError;

const SECONDS_PER_DAY: i64 = 86_400;

lazy_static::lazy_static! {
    /// `2025-03-01 08:00:00 (CST)` style timestamps with a zone abbreviation.
    static ref ZONE_ANNOTATED: Regex =
        Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) \(([A-Za-z]{2,5})\)$")
            .expect("zone annotation pattern is valid");
}

/// One accepted timestamp layout.
#[derive(Debug, Clone, Copy)]
enum Layout {
    /// chrono format carrying a time of day
    DateTime(&'static str),
    /// chrono format for a bare date (midnight UTC)
    Date(&'static str),
    /// Date-time followed by a parenthesized zone abbreviation
    ZoneAnnotated,
}

/// Layouts in the order they are attempted. All are read as UTC.
const LAYOUTS: &[Layout] = &[
    Layout::DateTime("%Y-%m-%dT%H:%M:%SZ"),
    Layout::DateTime("%Y-%m-%dT%H:%M:%S%.fZ"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S"),
    Layout::Date("%Y-%m-%d"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S (UTC+8)"),
    Layout::ZoneAnnotated,
];

const BARE_DATE: &str = "%Y-%m-%d";

/// A successfully normalized expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    /// Calendar date of the expiration (UTC)
    pub date: NaiveDate,
    /// `floor((expiration - now) / 1 day)`, negative once expired
    pub days_remaining: i64,
}

/// Normalize an expiration timestamp against the current time.
pub fn normalize(raw: &str) -> Result<NormalizedDate, WhoisSweepError> {
    normalize_at(raw, Utc::now())
}

/// Normalize an expiration timestamp against an explicit clock.
///
/// # Errors
///
/// Returns `WhoisSweepError::ParseError` when no layout matches, so the
/// caller can fall back to displaying the raw text.
pub fn normalize_at(raw: &str, now: DateTime<Utc>) -> Result<NormalizedDate, WhoisSweepError> {
    let cleaned = raw.trim();

    let parsed = parse_with_layouts(cleaned)
        .or_else(|| {
            if cleaned.contains(char::is_whitespace) {
                let first = cleaned.split_whitespace().next()?;
                parse_date_only(first, BARE_DATE)
            } else {
                None
            }
        })
        .ok_or_else(|| {
            WhoisSweepError::parse_with_content(
                format!("unrecognized expiration date '{}'", cleaned),
                cleaned,
            )
        })?;

    let seconds = (parsed.and_utc() - now).num_seconds();

    Ok(NormalizedDate {
        date: parsed.date(),
        days_remaining: seconds.div_euclid(SECONDS_PER_DAY),
    })
}

fn parse_with_layouts(input: &str) -> Option<NaiveDateTime> {
    LAYOUTS.iter().find_map(|layout| match layout {
        Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(input, fmt).ok(),
        Layout::Date(fmt) => parse_date_only(input, fmt),
        Layout::ZoneAnnotated => {
            let caps = ZONE_ANNOTATED.captures(input)?;
            NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d %H:%M:%S").ok()
        }
    })
}

fn parse_date_only(input: &str, fmt: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(input, fmt)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_every_layout_yields_encoded_date() {
        let cases = [
            "2024-01-15T08:30:00Z",
            "2024-01-15T08:30:00.000Z",
            "2024-01-15T08:30:00.123456Z",
            "2024-01-15 08:30:00",
            "2024-01-15",
            "2024-01-15 08:30:00 (UTC+8)",
            "2024-01-15 08:30:00 (CST)",
            "2024-01-15 08:30:00 (MST)",
        ];

        for raw in cases {
            let normalized = normalize_at(raw, fixed_now())
                .unwrap_or_else(|e| panic!("'{}' should normalize: {}", raw, e));
            assert_eq!(normalized.date, ymd(2024, 1, 15), "layout: {}", raw);
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let normalized = normalize_at("  2024-01-15\r\n", fixed_now()).unwrap();
        assert_eq!(normalized.date, ymd(2024, 1, 15));
    }

    #[test]
    fn test_first_token_fallback() {
        let normalized = normalize_at("2024-01-15 12:00:00 +0800 CST", fixed_now()).unwrap();
        assert_eq!(normalized.date, ymd(2024, 1, 15));
    }

    #[test]
    fn test_unparseable_input_is_an_error() {
        assert!(normalize_at("not a date", fixed_now()).is_err());
        assert!(normalize_at("", fixed_now()).is_err());
        assert!(normalize_at("15-Jan-2024", fixed_now()).is_err());
        assert!(matches!(
            normalize_at("2024/01/15", fixed_now()),
            Err(WhoisSweepError::ParseError { .. })
        ));
    }

    #[test]
    fn test_days_remaining_is_floored() {
        // 2024-01-15T00:00Z is 13.5 days after 2024-01-01T12:00Z
        let ahead = normalize_at("2024-01-15", fixed_now()).unwrap();
        assert_eq!(ahead.days_remaining, 13);

        // 2023-12-31T00:00Z is 1.5 days before now: floor gives -2
        let expired = normalize_at("2023-12-31", fixed_now()).unwrap();
        assert_eq!(expired.days_remaining, -2);

        let same_instant = normalize_at("2024-01-01 12:00:00", fixed_now()).unwrap();
        assert_eq!(same_instant.days_remaining, 0);
    }

    #[test]
    fn test_normalize_uses_current_clock() {
        let far_future = normalize("2999-01-01").unwrap();
        assert!(far_future.days_remaining > 0);
    }
}
