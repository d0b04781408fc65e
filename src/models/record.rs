//! Normalized schedule record written for the calendar display.

use serde::{Deserialize, Serialize};

/// One class meeting in the published schedule.
///
/// Field order is the serialized key order. The local-file policy leaves
/// gaps as `null`; the remote-sheet policy fills every field. The two
/// trailing fields belong to the extended shape and are only serialized
/// when the policy populates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub course_number: String,

    pub instructors: Option<String>,

    pub days: Option<String>,

    pub time_of_day: Option<String>,

    /// Class length in minutes
    pub duration: Option<i64>,

    pub location: Option<String>,

    #[serde(rename = "type")]
    pub class_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anticipated_enrollment: Option<i64>,
}

impl ScheduleRecord {
    /// True when the class has no parseable meeting time.
    pub fn is_unscheduled(&self) -> bool {
        matches!(self.duration, None | Some(0))
    }
}
