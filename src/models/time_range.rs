//! Parsed class meeting time.

use chrono::NaiveTime;

/// Result of parsing a TIME cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// A start and end time of day. `end` may be earlier than `start`.
    Scheduled { start: NaiveTime, end: NaiveTime },
    /// TBA, asynchronous, blank, or malformed.
    Unparseable,
}

impl TimeRange {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, TimeRange::Scheduled { .. })
    }

    /// Whole minutes from start to end, truncated toward zero.
    ///
    /// Ranges that cross midnight are not wrapped and come out negative.
    pub fn duration_minutes(&self) -> Option<i64> {
        match self {
            TimeRange::Scheduled { start, end } => {
                Some(end.signed_duration_since(*start).num_seconds() / 60)
            }
            TimeRange::Unparseable => None,
        }
    }
}
