// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! ISO-8601 date and timestamp normalization.
//!
//! Two conversions are supported:
//!
//! * **Dates** become the integer `YYYYMMDD` of the calendar date as written.
//!   Any time of day or UTC offset is ignored.
//! * **Timestamps** become whole seconds since the Unix epoch. Values that
//!   carry a UTC offset use it; naive values are interpreted in a configurable
//!   [`NaiveZone`]. Sub-second parts are rounded to the nearest second with
//!   ties going to the even second.
//!
//! The accepted grammar is `YYYY-MM-DD[(T| )HH[:MM[:SS[.f{1,9}]]][Z|±HH[[:]MM[:SS]]]]`.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DATE_LEN: usize = 10;
const HALF_SECOND_NANOS: u32 = 500_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateTimeError {
    #[error("Invalid isoformat string: '{0}'")]
    InvalidFormat(String),

    #[error("Nonexistent local time: '{0}'")]
    NonexistentLocal(String),
}

/// Time zone used for timestamps written without a UTC offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NaiveZone {
    #[default]
    Utc,
    Local,
}

/// A parsed ISO-8601 value, keeping the wall-clock reading separate from the
/// offset it was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedDateTime {
    pub naive: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

/// Parses an ISO-8601 date or date-time.
///
/// # Errors
///
/// Returns [`DateTimeError::InvalidFormat`] if the value does not follow the
/// accepted grammar or names an impossible date, time or offset.
pub fn parse_iso(value: &str) -> Result<ParsedDateTime, DateTimeError> {
    let invalid = || DateTimeError::InvalidFormat(value.to_string());

    if !value.is_ascii() || value.len() < DATE_LEN {
        return Err(invalid());
    }

    let (date_part, rest) = value.split_at(DATE_LEN);
    let date = parse_date(date_part).ok_or_else(invalid)?;

    if rest.is_empty() {
        return Ok(ParsedDateTime {
            naive: date.and_time(NaiveTime::MIN),
            offset: None,
        });
    }

    let rest = rest.strip_prefix(['T', ' ']).ok_or_else(invalid)?;
    let (time_part, offset_part) = match rest.find(['Z', '+', '-']) {
        Some(i) => (&rest[..i], Some(&rest[i..])),
        None => (rest, None),
    };

    let time = parse_time(time_part).ok_or_else(invalid)?;
    let offset = match offset_part {
        Some(o) => Some(parse_offset(o).ok_or_else(invalid)?),
        None => None,
    };

    Ok(ParsedDateTime {
        naive: date.and_time(time),
        offset,
    })
}

/// Converts a date or date-time to its `YYYYMMDD` calendar date.
pub fn to_date_int(value: &str) -> Result<String, DateTimeError> {
    let parsed = parse_iso(value)?;
    Ok(parsed.naive.format("%Y%m%d").to_string())
}

/// Converts a date or date-time to whole seconds since the Unix epoch.
///
/// # Arguments
///
/// * `value` - The ISO-8601 text.
/// * `zone` - The zone applied when `value` has no UTC offset.
///
/// # Errors
///
/// Returns an error if the value cannot be parsed, or if it is a naive local
/// time that falls into a daylight-saving gap.
pub fn to_epoch(value: &str, zone: NaiveZone) -> Result<i64, DateTimeError> {
    let parsed = parse_iso(value)?;

    let (secs, nanos) = match (parsed.offset, zone) {
        (Some(offset), _) => {
            let dt = parsed.naive.and_utc();
            let secs = dt.timestamp() - i64::from(offset.local_minus_utc());
            (secs, dt.timestamp_subsec_nanos())
        }
        (None, NaiveZone::Utc) => {
            let dt = parsed.naive.and_utc();
            (dt.timestamp(), dt.timestamp_subsec_nanos())
        }
        (None, NaiveZone::Local) => {
            let dt = earlier_instant(Local.from_local_datetime(&parsed.naive))
                .ok_or_else(|| DateTimeError::NonexistentLocal(value.to_string()))?;
            (dt.timestamp(), dt.timestamp_subsec_nanos())
        }
    };

    Ok(round_half_even(secs, nanos))
}

/// Resolves a local reading, taking the earlier instant when the reading
/// falls in a repeated hour. `None` for readings inside a gap.
fn earlier_instant<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>) -> Option<DateTime<Tz>> {
    match result {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(a, b) => Some(a.min(b)),
        LocalResult::None => None,
    }
}

fn round_half_even(secs: i64, nanos: u32) -> i64 {
    match nanos.cmp(&HALF_SECOND_NANOS) {
        Ordering::Less => secs,
        Ordering::Greater => secs + 1,
        Ordering::Equal if secs.rem_euclid(2) == 0 => secs,
        Ordering::Equal => secs + 1,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    if b.len() != DATE_LEN || b[4] != b'-' || b[7] != b'-' {
        return None;
    }

    let year = digits(&s[0..4])?;
    let month = digits(&s[5..7])?;
    let day = digits(&s[8..10])?;

    if year == 0 {
        return None;
    }

    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let (clock, fraction) = match s.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (s, None),
    };

    let fields = clock.split(':').map(two_digits).collect::<Option<Vec<u32>>>()?;
    let (hour, minute, second) = match fields.as_slice() {
        [h] => (*h, 0, 0),
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    let nanos = match fraction {
        None => 0,
        // Fractions are only valid after seconds.
        Some(f) if fields.len() == 3 && (1..=9).contains(&f.len()) => {
            digits(f)? * 10u32.pow(9 - f.len() as u32)
        }
        Some(_) => return None,
    };

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }

    let sign = match s.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let body = &s[1..];

    let (hours, minutes, seconds) = match body.len() {
        2 => (two_digits(body)?, 0, 0),
        4 => (two_digits(&body[..2])?, two_digits(&body[2..])?, 0),
        5 if body.as_bytes()[2] == b':' => (two_digits(&body[..2])?, two_digits(&body[3..])?, 0),
        8 if body.as_bytes()[2] == b':' && body.as_bytes()[5] == b':' => (
            two_digits(&body[..2])?,
            two_digits(&body[3..5])?,
            two_digits(&body[6..])?,
        ),
        _ => return None,
    };

    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let total = (hours * 3600 + minutes * 60 + seconds) as i32;
    FixedOffset::east_opt(sign * total)
}

fn two_digits(s: &str) -> Option<u32> {
    if s.len() != 2 {
        return None;
    }
    digits(s)
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
