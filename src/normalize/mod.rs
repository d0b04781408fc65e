//! Row normalization.
//!
//! Maps loosely structured schedule rows onto [`ScheduleRecord`]s. A single
//! pure function serves both conversions; everything that differs between
//! them lives in the [`NormalizePolicy`].

mod policy;

pub use policy::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculate::parse_time_range;
use crate::models::{InputRow, ScheduleRecord, SourceTable};

/// Errors that abort a normalization run.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("A required column was not found: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },
}

/// Check that the table header carries every column the policy requires.
pub fn check_columns(headers: &[String], policy: &NormalizePolicy) -> Result<(), NormalizeError> {
    let missing: Vec<String> = policy
        .required_columns()
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == column))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(NormalizeError::MissingColumns { columns: missing })
    }
}

/// Normalize one row. Never fails; per-row gaps are resolved by the policy.
pub fn normalize_row(row: &InputRow, policy: &NormalizePolicy) -> ScheduleRecord {
    use OutputField::*;

    let text = |field: OutputField| policy.column_for(field).and_then(|column| row.text(column));

    let course_number = row
        .get(&policy.columns.course)
        .map(|cell| cell.to_string())
        .unwrap_or_default();

    let time_range = parse_time_range(row.text(&policy.columns.time).as_deref());
    let duration = time_range.duration_minutes();

    let mut days = text(Days);
    let mut time_of_day = text(TimeOfDay);

    if duration.is_none() {
        if let Some(cleanup) = &policy.unscheduled {
            debug!(
                course = %course_number,
                time = ?time_of_day,
                "Relabeling unscheduled course as {}",
                cleanup.time_of_day
            );
            time_of_day = Some(cleanup.time_of_day.clone());
            days = Some(cleanup.days.clone());
        }
    }

    let mut record = ScheduleRecord {
        instructors: text(Instructors),
        days,
        time_of_day,
        duration,
        location: text(Location),
        class_type: text(Type),
        notes: text(Notes),
        anticipated_enrollment: enrollment(row, policy, &course_number),
        course_number,
    };

    let extended = policy.shape == RecordShape::Extended;

    if let Some(defaults) = &policy.defaults {
        record.instructors.get_or_insert_with(|| defaults.instructors.clone());
        record.days.get_or_insert_with(|| defaults.days.clone());
        record.time_of_day.get_or_insert_with(|| defaults.time_of_day.clone());
        record.location.get_or_insert_with(|| defaults.location.clone());
        record.class_type.get_or_insert_with(|| defaults.class_type.clone());
        record.duration.get_or_insert(defaults.duration);
        if extended {
            record.notes.get_or_insert_with(|| defaults.notes.clone());
            record.anticipated_enrollment.get_or_insert(defaults.anticipated_enrollment);
        }
    }

    // Extended keys must serialize even without defaults.
    if extended {
        record.notes.get_or_insert_with(String::new);
        record.anticipated_enrollment.get_or_insert(0);
    }

    record
}

/// Read the enrollment cell as an integer.
fn enrollment(row: &InputRow, policy: &NormalizePolicy, course: &str) -> Option<i64> {
    let cell = policy
        .column_for(OutputField::AnticipatedEnrollment)
        .and_then(|column| row.get(column))
        .filter(|cell| !cell.is_blank())?;

    let value = cell.as_integer();
    if value.is_none() {
        warn!(course = %course, value = %cell, "Enrollment is not a whole number, ignoring");
    }
    value
}

/// Normalize a whole table, preserving row order.
///
/// Fails only when the header lacks a column the policy requires.
pub fn normalize_table(
    table: &SourceTable,
    policy: &NormalizePolicy,
) -> Result<Vec<ScheduleRecord>, NormalizeError> {
    check_columns(&table.headers, policy)?;

    let records: Vec<ScheduleRecord> = table
        .rows
        .iter()
        .map(|row| normalize_row(row, policy))
        .collect();

    let unscheduled = records.iter().filter(|r| r.is_unscheduled()).count();
    info!(
        "Normalized {} rows with the {} policy ({} without a parseable time)",
        records.len(),
        policy.name,
        unscheduled
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use pretty_assertions::assert_eq;

    fn full_row() -> InputRow {
        InputRow::new()
            .with("COURSE", "CS 1400")
            .with("INSTRUCTOR", "Smith")
            .with("DAYS", "MW")
            .with("TIME", "9:00AM-10:15AM")
            .with("LOCATION", "SCI 210")
            .with("TYPE", "Lecture")
            .with("NOTES", "Lab fee")
            .with("ENROLL", 32_i64)
            .with("ROOM CAP", 40_i64)
    }

    fn headers(row: &[&str]) -> Vec<String> {
        row.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_local_full_row() {
        let record = normalize_row(&full_row(), &NormalizePolicy::local());

        assert_eq!(
            record,
            ScheduleRecord {
                course_number: "CS 1400".to_string(),
                instructors: Some("Smith".to_string()),
                days: Some("MW".to_string()),
                time_of_day: Some("9:00AM-10:15AM".to_string()),
                duration: Some(75),
                location: Some("SCI 210".to_string()),
                class_type: Some("Lecture".to_string()),
                notes: None,
                anticipated_enrollment: None,
            }
        );
    }

    #[test]
    fn test_local_keeps_unparseable_time_as_null_duration() {
        let row = full_row().with("TIME", "TBA");
        let record = normalize_row(&row, &NormalizePolicy::local());

        assert_eq!(record.time_of_day.as_deref(), Some("TBA"));
        assert_eq!(record.days.as_deref(), Some("MW"));
        assert_eq!(record.duration, None);
    }

    #[test]
    fn test_local_leaves_blank_cells_null() {
        let row = full_row().with("INSTRUCTOR", CellValue::Empty);
        let record = normalize_row(&row, &NormalizePolicy::local());
        assert_eq!(record.instructors, None);
    }

    #[test]
    fn test_remote_full_row() {
        let record = normalize_row(&full_row(), &NormalizePolicy::remote());

        assert_eq!(record.duration, Some(75));
        assert_eq!(record.notes.as_deref(), Some("Lab fee"));
        assert_eq!(record.anticipated_enrollment, Some(32));
    }

    #[test]
    fn test_remote_unscheduled_cleanup() {
        let row = full_row().with("TIME", "Async");
        let record = normalize_row(&row, &NormalizePolicy::remote());

        assert_eq!(record.time_of_day.as_deref(), Some("Online/Asynchronous"));
        assert_eq!(record.days.as_deref(), Some(""));
        assert_eq!(record.duration, Some(0));
    }

    #[test]
    fn test_remote_blank_time_is_unscheduled() {
        let row = full_row().with("TIME", CellValue::Empty);
        let record = normalize_row(&row, &NormalizePolicy::remote());

        assert_eq!(record.time_of_day.as_deref(), Some("Online/Asynchronous"));
        assert_eq!(record.duration, Some(0));
    }

    #[test]
    fn test_remote_missing_optional_columns_take_defaults() {
        let row = InputRow::new()
            .with("COURSE", "HIST 2700")
            .with("TIME", "1:00 PM-2:15 PM");
        let record = normalize_row(&row, &NormalizePolicy::remote());

        assert_eq!(
            record,
            ScheduleRecord {
                course_number: "HIST 2700".to_string(),
                instructors: Some("TBD".to_string()),
                days: Some(String::new()),
                time_of_day: Some("1:00 PM-2:15 PM".to_string()),
                duration: Some(75),
                location: Some("TBD".to_string()),
                class_type: Some("N/A".to_string()),
                notes: Some(String::new()),
                anticipated_enrollment: Some(0),
            }
        );
    }

    #[test]
    fn test_remote_blank_cells_take_defaults() {
        let row = full_row()
            .with("LOCATION", "  ")
            .with("TYPE", CellValue::Empty)
            .with("ENROLL", CellValue::Empty);
        let record = normalize_row(&row, &NormalizePolicy::remote());

        assert_eq!(record.location.as_deref(), Some("TBD"));
        assert_eq!(record.class_type.as_deref(), Some("N/A"));
        assert_eq!(record.anticipated_enrollment, Some(0));
    }

    #[test]
    fn test_remote_non_numeric_enrollment_defaults_to_zero() {
        let row = full_row().with("ENROLL", "about 30");
        let record = normalize_row(&row, &NormalizePolicy::remote());
        assert_eq!(record.anticipated_enrollment, Some(0));
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = DefaultValues {
            location: "Online".to_string(),
            ..DefaultValues::default()
        };
        let policy = NormalizePolicy::remote().with_defaults(defaults);
        let row = InputRow::new().with("COURSE", "ART 1010").with("TIME", "TBA");

        let record = normalize_row(&row, &policy);
        assert_eq!(record.location.as_deref(), Some("Online"));
        assert_eq!(record.days.as_deref(), Some(""));
    }

    #[test]
    fn test_numeric_course_is_stringified() {
        let row = full_row().with("COURSE", 1010_i64);
        let record = normalize_row(&row, &NormalizePolicy::local());
        assert_eq!(record.course_number, "1010");
    }

    #[test]
    fn test_missing_course_cell_is_empty_string() {
        let row = InputRow::new().with("TIME", "TBA");
        let record = normalize_row(&row, &NormalizePolicy::remote());
        assert_eq!(record.course_number, "");
    }

    #[test]
    fn test_output_key_set_is_fixed() {
        let sparse = InputRow::new().with("COURSE", "X");

        let remote = serde_json::to_value(normalize_row(&sparse, &NormalizePolicy::remote())).unwrap();
        let keys: Vec<&str> = remote.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected: Vec<&str> =
            RecordShape::Extended.fields().iter().map(|f| f.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        expected.sort();
        assert_eq!(sorted, expected);

        let local = serde_json::to_value(normalize_row(&full_row(), &NormalizePolicy::local())).unwrap();
        assert_eq!(local.as_object().unwrap().len(), RecordShape::Basic.fields().len());
    }

    #[test]
    fn test_check_columns_strict_reports_missing() {
        let header = headers(&["COURSE", "INSTRUCTOR", "DAYS", "TIME", "TYPE"]);
        let err = check_columns(&header, &NormalizePolicy::local()).unwrap_err();

        match &err {
            NormalizeError::MissingColumns { columns } => assert_eq!(columns, &vec!["LOCATION"]),
        }
        assert!(err.to_string().contains("LOCATION"));
    }

    #[test]
    fn test_check_columns_lenient_needs_course_and_time() {
        let policy = NormalizePolicy::remote();
        assert!(check_columns(&headers(&["COURSE", "TIME"]), &policy).is_ok());
        assert!(check_columns(&headers(&["COURSE", "DAYS"]), &policy).is_err());
    }

    #[test]
    fn test_normalize_table_preserves_order() {
        let table = SourceTable::new(
            headers(&["COURSE", "INSTRUCTOR", "DAYS", "TIME", "LOCATION", "TYPE"]),
            vec![
                full_row().with("COURSE", "B"),
                full_row().with("COURSE", "A"),
                full_row().with("COURSE", "B"),
            ],
        );

        let records = normalize_table(&table, &NormalizePolicy::local()).unwrap();
        let courses: Vec<&str> = records.iter().map(|r| r.course_number.as_str()).collect();
        assert_eq!(courses, vec!["B", "A", "B"]);
    }

    #[test]
    fn test_normalize_table_strict_failure() {
        let table = SourceTable::new(headers(&["COURSE", "TIME"]), vec![full_row()]);
        assert!(normalize_table(&table, &NormalizePolicy::local()).is_err());
    }
}
