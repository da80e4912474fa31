//! Parsing and canonical formatting of login signing times.
//!
//! Two layouts are accepted, tried in order:
//! 1. ISO-8601 in UTC, `2006-01-02T15:04:05Z` (fractional seconds tolerated);
//! 2. the shell `date` default, `Mon Jan  2 15:04:05 MST 2006`. The zone
//!    abbreviation is read as UTC.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const ISO_8601_PARSE: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]Z"
);

const ISO_8601_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

const SHELL_DEFAULT: &[BorrowedFormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:none] [hour]:[minute]:[second] [year]"
);

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parsers in the order they are attempted.
const PARSERS: [fn(&str) -> Option<OffsetDateTime>; 2] = [parse_iso_8601, parse_shell_default];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("couldn't parse {raw}")]
pub struct SigningTimeError {
    pub raw: String,
}

/// Parses a signing time with the first layout that accepts it.
///
/// # Errors
/// Returns [`SigningTimeError`] if no layout matches.
pub fn parse_signing_time(raw: &str) -> Result<OffsetDateTime, SigningTimeError> {
    PARSERS
        .iter()
        .find_map(|parse| parse(raw))
        .ok_or_else(|| SigningTimeError {
            raw: raw.to_owned(),
        })
}

/// Formats a signing time the way it appears in the signed message:
/// UTC, whole seconds, ISO-8601.
///
/// # Errors
/// Fails only for years outside `0..=9999`.
pub fn format_signing_time(t: OffsetDateTime) -> Result<String, time::error::Format> {
    t.to_offset(UtcOffset::UTC).format(ISO_8601_FORMAT)
}

fn parse_iso_8601(raw: &str) -> Option<OffsetDateTime> {
    PrimitiveDateTime::parse(raw, ISO_8601_PARSE)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn parse_shell_default(raw: &str) -> Option<OffsetDateTime> {
    let fields: Vec<&str> = raw.split_whitespace().collect();
    let [weekday, month, day, clock, zone, year] = fields.as_slice() else {
        return None;
    };
    if !WEEKDAYS.contains(weekday) || !is_zone_abbreviation(zone) {
        return None;
    }
    let normalized = format!("{month} {day} {clock} {year}");
    PrimitiveDateTime::parse(&normalized, SHELL_DEFAULT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn is_zone_abbreviation(zone: &str) -> bool {
    (3..=5).contains(&zone.len()) && zone.bytes().all(|b| b.is_ascii_uppercase())
}
