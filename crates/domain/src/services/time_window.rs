//! Time-restriction evaluation.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use crate::models::zone::TimeRestriction;

/// Whether a timestamp falls inside the zone's allowed window. Absence
/// of a restriction means always allowed.
///
/// The timestamp is converted to the zone's local clock via its fixed
/// UTC offset, the weekday (0 = Sunday) is checked against the allowed
/// set, then the minute-of-day against `[start, end)`. An `end` before
/// `start` spans midnight; `end == start` is an empty window.
pub fn within_window(restriction: Option<&TimeRestriction>, timestamp: DateTime<Utc>) -> bool {
    let Some(restriction) = restriction else {
        return true;
    };

    let offset = FixedOffset::east_opt(restriction.utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    let local = timestamp.with_timezone(&offset);

    let weekday = local.weekday().num_days_from_sunday() as u8;
    if !restriction.allowed_days.contains(&weekday) {
        return false;
    }

    let minute = (local.hour() * 60 + local.minute()) as u16;
    let (start, end) = (restriction.start_minute, restriction.end_minute);

    if start <= end {
        minute >= start && minute < end
    } else {
        minute >= start || minute < end
    }
}
