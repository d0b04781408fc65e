//! Class duration calculation.
//!
//! Turns a free-text TIME cell such as `"9:00 AM-10:15 AM"` or
//! `"1:30PM-2:45PM"` into a length in minutes. Anything that does not read
//! as a 12-hour `H:MM AM/PM` range (TBA, asynchronous, blank, typos) comes
//! back as unparseable rather than an error.

use chrono::NaiveTime;

use crate::models::TimeRange;

/// Placeholder instructors put in the TIME column for unassigned slots.
pub const TBA: &str = "TBA";

/// Parse a TIME cell into a [`TimeRange`].
pub fn parse_time_range(raw: Option<&str>) -> TimeRange {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return TimeRange::Unparseable,
    };

    if raw == TBA || !raw.contains('-') {
        return TimeRange::Unparseable;
    }

    let spaced = raw.replace("AM", " AM").replace("PM", " PM");

    let mut halves = spaced.split('-');
    let (Some(start), Some(end), None) = (halves.next(), halves.next(), halves.next()) else {
        return TimeRange::Unparseable;
    };

    match (parse_clock(start.trim()), parse_clock(end.trim())) {
        (Some(start), Some(end)) => TimeRange::Scheduled { start, end },
        _ => TimeRange::Unparseable,
    }
}

/// Duration in minutes of a TIME cell, or `None` when it cannot be parsed.
pub fn calculate_duration(raw: Option<&str>) -> Option<i64> {
    parse_time_range(raw).duration_minutes()
}

/// Parse a single 12-hour clock reading like `"9:05 AM"` or `"12:30 pm"`.
///
/// The meridiem must be separated from the digits by whitespace.
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let (clock, meridiem) = s.rsplit_once(char::is_whitespace)?;

    let pm = if meridiem.eq_ignore_ascii_case("am") {
        false
    } else if meridiem.eq_ignore_ascii_case("pm") {
        true
    } else {
        return None;
    };

    let (hour, minute) = clock.trim_end().split_once(':')?;
    let hour = parse_clock_field(hour)?;
    let minute = parse_clock_field(minute)?;

    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_clock_field(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
