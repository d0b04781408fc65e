//! Normalization policies.
//!
//! A [`NormalizePolicy`] enumerates everything that differs between the
//! local-file and remote-sheet conversions: the rename table, the output
//! shape, whether missing columns are fatal, the default values and the
//! relabeling of unscheduled classes.

use serde::{Deserialize, Serialize};

/// A key of the output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputField {
    CourseNumber,
    Instructors,
    Days,
    TimeOfDay,
    Duration,
    Location,
    Type,
    Notes,
    AnticipatedEnrollment,
}

impl OutputField {
    /// JSON key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            OutputField::CourseNumber => "course_number",
            OutputField::Instructors => "instructors",
            OutputField::Days => "days",
            OutputField::TimeOfDay => "time_of_day",
            OutputField::Duration => "duration",
            OutputField::Location => "location",
            OutputField::Type => "type",
            OutputField::Notes => "notes",
            OutputField::AnticipatedEnrollment => "anticipated_enrollment",
        }
    }
}

/// Which keys each output record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordShape {
    /// The seven calendar keys.
    Basic,
    /// The calendar keys plus `notes` and `anticipated_enrollment`.
    Extended,
}

impl RecordShape {
    /// Output keys in serialized order.
    pub fn fields(&self) -> &'static [OutputField] {
        const BASIC: &[OutputField] = &[
            OutputField::CourseNumber,
            OutputField::Instructors,
            OutputField::Days,
            OutputField::TimeOfDay,
            OutputField::Duration,
            OutputField::Location,
            OutputField::Type,
        ];
        const EXTENDED: &[OutputField] = &[
            OutputField::CourseNumber,
            OutputField::Instructors,
            OutputField::Days,
            OutputField::TimeOfDay,
            OutputField::Duration,
            OutputField::Location,
            OutputField::Type,
            OutputField::Notes,
            OutputField::AnticipatedEnrollment,
        ];

        match self {
            RecordShape::Basic => BASIC,
            RecordShape::Extended => EXTENDED,
        }
    }
}

/// How a table with missing columns is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnMode {
    /// Every renamed column must exist in the source header.
    Strict,
    /// Only COURSE and TIME must exist; other gaps take defaults.
    Lenient,
}

/// Source column headers, overridable per semester in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_course")]
    pub course: String,

    #[serde(default = "default_instructor")]
    pub instructor: String,

    #[serde(default = "default_days")]
    pub days: String,

    #[serde(default = "default_time")]
    pub time: String,

    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_type", rename = "type")]
    pub class_type: String,

    #[serde(default = "default_notes")]
    pub notes: String,

    #[serde(default = "default_enroll")]
    pub enroll: String,
}

fn default_course() -> String {
    "COURSE".to_string()
}

fn default_instructor() -> String {
    "INSTRUCTOR".to_string()
}

fn default_days() -> String {
    "DAYS".to_string()
}

fn default_time() -> String {
    "TIME".to_string()
}

fn default_location() -> String {
    "LOCATION".to_string()
}

fn default_type() -> String {
    "TYPE".to_string()
}

fn default_notes() -> String {
    "NOTES".to_string()
}

fn default_enroll() -> String {
    "ENROLL".to_string()
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            course: default_course(),
            instructor: default_instructor(),
            days: default_days(),
            time: default_time(),
            location: default_location(),
            class_type: default_type(),
            notes: default_notes(),
            enroll: default_enroll(),
        }
    }
}

/// Values used for missing cells in the remote-sheet conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultValues {
    #[serde(default = "default_tbd")]
    pub instructors: String,

    #[serde(default)]
    pub days: String,

    #[serde(default = "default_tbd")]
    pub time_of_day: String,

    #[serde(default = "default_tbd")]
    pub location: String,

    #[serde(default = "default_class_type", rename = "type")]
    pub class_type: String,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub anticipated_enrollment: i64,

    #[serde(default)]
    pub duration: i64,
}

fn default_tbd() -> String {
    "TBD".to_string()
}

fn default_class_type() -> String {
    "N/A".to_string()
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self {
            instructors: default_tbd(),
            days: String::new(),
            time_of_day: default_tbd(),
            location: default_tbd(),
            class_type: default_class_type(),
            notes: String::new(),
            anticipated_enrollment: 0,
            duration: 0,
        }
    }
}

/// Relabeling applied to rows whose TIME could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnscheduledCleanup {
    pub time_of_day: String,
    pub days: String,
}

impl Default for UnscheduledCleanup {
    fn default() -> Self {
        Self {
            time_of_day: "Online/Asynchronous".to_string(),
            days: String::new(),
        }
    }
}

/// Everything the row normalizer needs to know about a conversion.
#[derive(Debug, Clone)]
pub struct NormalizePolicy {
    /// Label used in logs ("local" or "remote").
    pub name: &'static str,
    pub columns: ColumnNames,
    pub shape: RecordShape,
    pub column_mode: ColumnMode,
    /// `None` leaves missing values as `null`.
    pub defaults: Option<DefaultValues>,
    /// `None` leaves unparseable TIME cells untouched.
    pub unscheduled: Option<UnscheduledCleanup>,
}

impl NormalizePolicy {
    /// Spreadsheet-file conversion: strict columns, no defaults.
    pub fn local() -> Self {
        Self {
            name: "local",
            columns: ColumnNames::default(),
            shape: RecordShape::Basic,
            column_mode: ColumnMode::Strict,
            defaults: None,
            unscheduled: None,
        }
    }

    /// Remote-sheet conversion: lenient columns, defaults, unscheduled
    /// relabeling, extended record shape.
    pub fn remote() -> Self {
        Self {
            name: "remote",
            columns: ColumnNames::default(),
            shape: RecordShape::Extended,
            column_mode: ColumnMode::Lenient,
            defaults: Some(DefaultValues::default()),
            unscheduled: Some(UnscheduledCleanup::default()),
        }
    }

    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Replace the default values. Has no effect on a policy without defaults.
    pub fn with_defaults(mut self, defaults: DefaultValues) -> Self {
        if self.defaults.is_some() {
            self.defaults = Some(defaults);
        }
        self
    }

    /// Source column feeding an output field, if the shape carries one.
    ///
    /// `course_number` and `duration` are derived from COURSE and TIME
    /// rather than renamed.
    pub fn column_for(&self, field: OutputField) -> Option<&str> {
        if !self.shape.fields().contains(&field) {
            return None;
        }

        let column = match field {
            OutputField::CourseNumber | OutputField::Duration => return None,
            OutputField::Instructors => &self.columns.instructor,
            OutputField::Days => &self.columns.days,
            OutputField::TimeOfDay => &self.columns.time,
            OutputField::Location => &self.columns.location,
            OutputField::Type => &self.columns.class_type,
            OutputField::Notes => &self.columns.notes,
            OutputField::AnticipatedEnrollment => &self.columns.enroll,
        };
        Some(column.as_str())
    }

    /// The rename table: source column to output field, in output order.
    pub fn renames(&self) -> Vec<(&str, OutputField)> {
        self.shape
            .fields()
            .iter()
            .filter_map(|&field| self.column_for(field).map(|column| (column, field)))
            .collect()
    }

    /// Columns whose absence aborts the conversion.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut required = vec![self.columns.course.as_str()];
        match self.column_mode {
            ColumnMode::Strict => {
                required.extend(self.renames().into_iter().map(|(column, _)| column));
            }
            ColumnMode::Lenient => required.push(self.columns.time.as_str()),
        }
        required
    }
}
