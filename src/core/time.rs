// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Timestamp and duration parsing.
//!
//! Timestamps become absolute Unix nanosecond instants and durations become
//! signed nanosecond offsets. Both are parsed once when an edit plan is
//! resolved, never per message.

use chrono::{DateTime, NaiveDateTime};

use super::error::EditError;

/// Zone-less layouts, interpreted as UTC, tried in order after RFC 3339.
///
/// `%.f` also accepts inputs without a fractional part.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

const NANOSECOND: u128 = 1;
const MICROSECOND: u128 = 1_000 * NANOSECOND;
const MILLISECOND: u128 = 1_000 * MICROSECOND;
const SECOND: u128 = 1_000 * MILLISECOND;
const MINUTE: u128 = 60 * SECOND;
const HOUR: u128 = 60 * MINUTE;

/// Errors from [`parse_timestamp`] and [`parse_duration`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    /// No supported layout matched
    #[error("unable to parse timestamp: {0}")]
    Timestamp(String),

    /// Malformed or out-of-range duration
    #[error("invalid duration \"{input}\": {reason}")]
    Duration {
        /// Raw input
        input: String,
        /// What went wrong
        reason: &'static str,
    },

    /// The instant cannot be represented as i64 nanoseconds
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
}

impl From<TimeParseError> for EditError {
    fn from(err: TimeParseError) -> Self {
        EditError::parse("time", err.to_string())
    }
}

/// Parse a timestamp string into Unix nanoseconds.
///
/// Accepts:
/// - Unix nanoseconds: "1700000000000000000"
/// - RFC 3339: "2006-01-02T15:04:05+07:00"
/// - ISO 8601 without zone: "2006-01-02T15:04:05" (optionally with fraction)
/// - Space separated: "2006-01-02 15:04:05"
/// - US: "01/02/2006 15:04:05", then EU: "02/01/2006 15:04:05"
pub fn parse_timestamp(input: &str) -> Result<i64, TimeParseError> {
    let s = input.trim();

    if let Ok(nanos) = s.parse::<i64>() {
        return Ok(nanos);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt
            .timestamp_nanos_opt()
            .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()));
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return naive
                .and_utc()
                .timestamp_nanos_opt()
                .ok_or_else(|| TimeParseError::OutOfRange(input.to_string()));
        }
    }

    Err(TimeParseError::Timestamp(input.to_string()))
}

/// Parse a signed duration such as "100ms", "-1h", "10m30s" or "1.5s".
///
/// Units: ns, us (µs, μs), ms, s, m, h. A bare "0" is accepted.
pub fn parse_duration(input: &str) -> Result<i64, TimeParseError> {
    let err = |reason| TimeParseError::Duration {
        input: input.to_string(),
        reason,
    };

    let mut s = input.trim();
    let negative = match s.as_bytes().first() {
        Some(b'-') => {
            s = &s[1..];
            true
        }
        Some(b'+') => {
            s = &s[1..];
            false
        }
        _ => false,
    };

    if s == "0" {
        return Ok(0);
    }
    if s.is_empty() {
        return Err(err("empty duration"));
    }

    let mut total: u128 = 0;
    while !s.is_empty() {
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, rest) = s.split_at(int_len);
        s = rest;

        let mut frac_part = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &rest[..frac_len];
            s = &rest[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err("expected a number"));
        }

        let unit_len = s
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (unit_str, rest) = s.split_at(unit_len);
        s = rest;

        let unit = match unit_str {
            "ns" => NANOSECOND,
            "us" | "µs" | "μs" => MICROSECOND,
            "ms" => MILLISECOND,
            "s" => SECOND,
            "m" => MINUTE,
            "h" => HOUR,
            "" => return Err(err("missing unit")),
            _ => return Err(err("unknown unit")),
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| err("number too large"))?
        };
        let mut value = whole.checked_mul(unit).ok_or_else(|| err("overflow"))?;

        // Digits beyond nanosecond precision of an hour cannot contribute.
        let frac_digits = &frac_part[..frac_part.len().min(18)];
        if !frac_digits.is_empty() {
            let numerator: u128 = frac_digits.parse().map_err(|_| err("bad fraction"))?;
            let scale = 10u128.pow(frac_digits.len() as u32);
            value = value
                .checked_add(numerator * unit / scale)
                .ok_or_else(|| err("overflow"))?;
        }

        total = total.checked_add(value).ok_or_else(|| err("overflow"))?;
    }

    let limit = if negative {
        i64::MAX as u128 + 1
    } else {
        i64::MAX as u128
    };
    if total > limit {
        return Err(err("overflow"));
    }

    Ok(if negative {
        (total as i128).wrapping_neg() as i64
    } else {
        total as i64
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_unix_nanos() {
        assert_eq!(
            parse_timestamp("1700000000000000000").unwrap(),
            1_700_000_000_000_000_000
        );
        assert_eq!(parse_timestamp("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        assert_eq!(
            parse_timestamp("1970-01-01T00:00:01Z").unwrap(),
            1_000_000_000
        );
        assert_eq!(
            parse_timestamp("1970-01-01T07:00:01+07:00").unwrap(),
            1_000_000_000
        );
        assert_eq!(
            parse_timestamp("1970-01-01T00:00:01.000Z").unwrap(),
            1_000_000_000
        );
    }

    #[test]
    fn test_parse_timestamp_naive_layouts() {
        assert_eq!(
            parse_timestamp("1970-01-01T00:00:02").unwrap(),
            2_000_000_000
        );
        assert_eq!(
            parse_timestamp("1970-01-01 00:00:02").unwrap(),
            2_000_000_000
        );
        assert_eq!(
            parse_timestamp("1970-01-01T00:00:02.000000005").unwrap(),
            2_000_000_005
        );
    }

    #[test]
    fn test_parse_timestamp_us_before_eu() {
        // 01/02 is ambiguous: the US layout wins
        let us = parse_timestamp("01/02/1970 00:00:00").unwrap();
        assert_eq!(us, 86_400 * 1_000_000_000);

        // 13/02 only fits the EU layout
        let eu = parse_timestamp("13/02/1970 00:00:00").unwrap();
        assert_eq!(eu, (31 + 12) * 86_400 * 1_000_000_000);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert_eq!(err.to_string(), "unable to parse timestamp: yesterday");
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("10ns").unwrap(), 10);
        assert_eq!(parse_duration("3us").unwrap(), 3_000);
        assert_eq!(parse_duration("3µs").unwrap(), 3_000);
        assert_eq!(parse_duration("100ms").unwrap(), 100_000_000);
        assert_eq!(parse_duration("2s").unwrap(), 2_000_000_000);
        assert_eq!(parse_duration("10m30s").unwrap(), 630_000_000_000);
        assert_eq!(parse_duration("-1h").unwrap(), -3_600_000_000_000);
        assert_eq!(parse_duration("+1m").unwrap(), 60_000_000_000);
    }

    #[test]
    fn test_parse_duration_fractions() {
        assert_eq!(parse_duration("1.5s").unwrap(), 1_500_000_000);
        assert_eq!(parse_duration(".5ms").unwrap(), 500_000);
        assert_eq!(parse_duration("-0.25h").unwrap(), -900_000_000_000);
    }

    #[test]
    fn test_parse_duration_zero() {
        assert_eq!(parse_duration("0").unwrap(), 0);
        assert_eq!(parse_duration("-0").unwrap(), 0);
    }

    #[test]
    fn test_parse_duration_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("9999999999999h").is_err());
    }

    #[test]
    fn test_parse_duration_huge_with_fraction() {
        // integer part fits after scaling; adding the fraction does not
        let whole = u128::MAX / HOUR;
        let input = format!("{whole}.999999999999999999h");
        assert!(parse_duration(&input).is_err());
    }

    #[test]
    fn test_parse_duration_i64_bounds() {
        assert_eq!(parse_duration("-9223372036854775808ns").unwrap(), i64::MIN);
        assert!(parse_duration("9223372036854775808ns").is_err());
    }

    #[test]
    fn test_time_error_into_edit_error() {
        let err: EditError = parse_duration("fast").unwrap_err().into();
        assert!(matches!(err, EditError::ParseError { .. }));
    }
}
