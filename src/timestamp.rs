//! ==============================================================================
//! timestamp.rs - record time formatting and parsing
//! ==============================================================================
//!
//! purpose:
//!     record times are stored as plain strings and sorted as strings.
//!     this module only turns them into instants for the retention window,
//!     and formats "now" for snapshots that arrive without a time.
//!
//! accepted input:
//!     YYYY-MM-DD
//!     YYYY-MM-DD[T| ]HH:MM[:SS[.fraction]]
//!     ...followed by an optional ±HH:MM offset
//!
//! ```text
//!     a UTC designator ("Z" or "+00:00") is dropped and the value is read
//!     as local wall-clock time, the same as a time with no offset at all.
//! ```
//!
//! ==============================================================================

use crate::error::TrimError;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// stand-in for records that carry no time; always far outside the window
pub const MISSING_TIME: &str = "2024-01-01";

/// format an instant the way records are written: `YYYY-MM-DD HH:MM:SS`
pub fn format_record_time(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| at.to_string())
}

/// parse a record time into an absolute instant
///
/// times without an explicit non-UTC offset are taken to be in `local`.
pub fn parse_instant(raw: &str, local: UtcOffset) -> Result<OffsetDateTime, TrimError> {
    let unparseable = || TrimError::Unparseable(raw.to_string());

    let naive = raw.replace('Z', "+00:00").replace("+00:00", "");
    let (body, offset) = split_offset(&naive).ok_or_else(unparseable)?;
    let datetime = parse_naive(body).ok_or_else(unparseable)?;

    Ok(datetime.assume_offset(offset.unwrap_or(local)))
}

fn split_offset(s: &str) -> Option<(&str, Option<UtcOffset>)> {
    // everything up to index 10 is the date, whose dashes are not offsets
    match s.rfind(|c: char| c == '+' || c == '-') {
        Some(idx) if idx > 10 => {
            let (body, tail) = s.split_at(idx);
            let offset = UtcOffset::parse(
                tail,
                format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
            )
            .ok()?;
            Some((body, Some(offset)))
        }
        _ => Some((s, None)),
    }
}

fn parse_naive(s: &str) -> Option<PrimitiveDateTime> {
    let (date_part, time_part) = match s.find(|c: char| c == 'T' || c == ' ') {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let date = Date::parse(date_part, format_description!("[year]-[month]-[day]")).ok()?;
    let time = match time_part {
        Some(t) => parse_time_of_day(t)?,
        None => Time::MIDNIGHT,
    };

    Some(PrimitiveDateTime::new(date, time))
}

fn parse_time_of_day(s: &str) -> Option<Time> {
    Time::parse(s, format_description!("[hour]:[minute]:[second].[subsecond]"))
        .or_else(|_| Time::parse(s, format_description!("[hour]:[minute]:[second]")))
        .or_else(|_| Time::parse(s, format_description!("[hour]:[minute]")))
        .ok()
}
