// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of efergy-rs.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! UTC offset handling
//!
//! The proxy localizes its timestamps with an `offset` query parameter expressed
//! in minutes *west* of UTC (the JavaScript `getTimezoneOffset` convention), so
//! New York in winter is `300`. Callers configure it either with a literal
//! offset (`"-05:00"`, `"+0530"`) or an IANA timezone name (`"Europe/Prague"`).

use crate::errors::{EfergyError, EfergyResult};
use chrono::{DateTime, Offset, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Signed offset from UTC, stored as minutes east of UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UtcOffset {
    minutes_east: i32,
}

impl UtcOffset {
    pub const UTC: Self = Self { minutes_east: 0 };

    /// Create an offset from minutes east of UTC
    pub fn from_minutes(minutes_east: i32) -> EfergyResult<Self> {
        if minutes_east.abs() > MAX_OFFSET_MINUTES {
            return Err(EfergyError::InvalidOffset(format!(
                "{minutes_east} minutes is outside of ±14:00"
            )));
        }
        Ok(Self { minutes_east })
    }

    /// Parse a literal offset or a timezone name, evaluating zones at the current instant
    pub fn parse(input: &str) -> EfergyResult<Self> {
        Self::parse_at(input, Utc::now())
    }

    /// Parse a literal offset or a timezone name, evaluating zones at `at`
    ///
    /// Literal offsets win: `"0400"` is four hours even though no zone carries that name.
    pub fn parse_at(input: &str, at: DateTime<Utc>) -> EfergyResult<Self> {
        let trimmed = input.trim();

        if let Some(minutes) = parse_literal(trimmed) {
            trace!("Parsed literal UTC offset '{}' = {} min", trimmed, minutes);
            return Self::from_minutes(minutes)
                .map_err(|_| EfergyError::InvalidOffset(input.to_owned()));
        }

        match trimmed.parse::<Tz>() {
            Ok(tz) => {
                let minutes = at.with_timezone(&tz).offset().fix().local_minus_utc() / 60;
                debug!("🌍 Timezone {} resolves to UTC offset {} min", tz.name(), minutes);
                Self::from_minutes(minutes)
            }
            Err(_) => Err(EfergyError::InvalidOffset(input.to_owned())),
        }
    }

    pub fn minutes_east(self) -> i32 {
        self.minutes_east
    }

    /// Offset in fractional hours (`-05:00` is `-5.0`)
    pub fn hours(self) -> f64 {
        f64::from(self.minutes_east) / 60.0
    }

    /// Value of the `offset` query parameter (minutes west of UTC)
    pub fn api_value(self) -> i32 {
        -self.minutes_east
    }
}

impl FromStr for UtcOffset {
    type Err = EfergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minutes_east < 0 { '-' } else { '+' };
        let abs = self.minutes_east.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
    }
}

/// Accepts `±HH:MM`, `±H:MM`, `±HHMM`, `±HMM`, `±HH` and `±H`
fn parse_literal(input: &str) -> Option<i32> {
    let (sign, rest) = match input.as_bytes().first().copied()? {
        b'-' => (-1, input.get(1..)?),
        b'+' => (1, input.get(1..)?),
        _ => (1, input),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => {
            if h.is_empty() || h.len() > 2 || m.len() != 2 {
                return None;
            }
            (digits(h)?, digits(m)?)
        }
        None => match rest.len() {
            1 | 2 => (digits(rest)?, 0),
            3 | 4 => {
                let (h, m) = rest.split_at(rest.len() - 2);
                (digits(h)?, digits(m)?)
            }
            _ => return None,
        },
    };

    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 60 + minutes))
}

fn digits(s: &str) -> Option<i32> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn winter() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap()
    }

    fn summer() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 7, 3, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_literal_negative_offset() {
        let offset = UtcOffset::parse("-05:00").unwrap();
        assert_eq!(offset.hours(), -5.0);
        assert_eq!(offset.minutes_east(), -300);
        assert_eq!(offset.api_value(), 300);
    }

    #[test]
    fn test_literal_forms() {
        assert_eq!(UtcOffset::parse("+05:30").unwrap().minutes_east(), 330);
        assert_eq!(UtcOffset::parse("0530").unwrap().minutes_east(), 330);
        assert_eq!(UtcOffset::parse("0400").unwrap().hours(), 4.0);
        assert_eq!(UtcOffset::parse("-930").unwrap().minutes_east(), -570);
        assert_eq!(UtcOffset::parse("+2").unwrap().minutes_east(), 120);
        assert_eq!(UtcOffset::parse("-1:00").unwrap().minutes_east(), -60);
        assert_eq!(UtcOffset::parse(" 00:00 ").unwrap(), UtcOffset::UTC);
    }

    #[test]
    fn test_literal_out_of_range() {
        assert!(matches!(
            UtcOffset::parse("+15:00"),
            Err(EfergyError::InvalidOffset(_))
        ));
        assert!(matches!(
            UtcOffset::parse("01:75"),
            Err(EfergyError::InvalidOffset(_))
        ));
    }

    #[test]
    fn test_named_zone_is_dst_aware() {
        let winter_offset = UtcOffset::parse_at("America/New_York", winter()).unwrap();
        assert_eq!(winter_offset.hours(), -5.0);
        assert_eq!(winter_offset.api_value(), 300);

        let summer_offset = UtcOffset::parse_at("America/New_York", summer()).unwrap();
        assert_eq!(summer_offset.hours(), -4.0);
        assert_eq!(summer_offset.api_value(), 240);
    }

    #[test]
    fn test_named_zone_east_of_utc() {
        let offset = UtcOffset::parse_at("Asia/Kolkata", winter()).unwrap();
        assert_eq!(offset.minutes_east(), 330);
        assert_eq!(offset.to_string(), "+05:30");
    }

    #[test]
    fn test_named_zone_now_matches_one_of_dst_states() {
        let hours = UtcOffset::parse("America/New_York").unwrap().hours();
        assert!(hours == -5.0 || hours == -4.0);
    }

    #[test]
    fn test_invalid_offset() {
        for input in ["not_a_zone", "abc", "", "+", "12:3", "123456", "-05:00:00"] {
            assert!(
                matches!(UtcOffset::parse(input), Err(EfergyError::InvalidOffset(_))),
                "expected '{input}' to be rejected"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(UtcOffset::parse("-05:00").unwrap().to_string(), "-05:00");
        assert_eq!(UtcOffset::UTC.to_string(), "+00:00");
        assert!("Europe/Prague".parse::<UtcOffset>().is_ok());
    }
}
