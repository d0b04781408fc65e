//! Schedule JSON documents.
//!
//! The calendar reads a single JSON array of records, pretty-printed with
//! four-space indentation. Documents are written to a temporary file next to
//! the destination and renamed into place, so readers never see a partial
//! file and a failed run leaves the previous document untouched.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::StorageError;
use crate::models::ScheduleRecord;

const INDENT: &[u8] = b"    ";

/// Serialize records with the calendar's indentation.
pub fn write_pretty<W: Write>(writer: W, records: &[ScheduleRecord]) -> Result<(), StorageError> {
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    records.serialize(&mut serializer)?;
    Ok(())
}

/// Render records as the exact text written to disk.
pub fn to_json_string(records: &[ScheduleRecord]) -> Result<String, StorageError> {
    let mut buffer = Vec::new();
    write_pretty(&mut buffer, records)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writer for the published schedule document.
#[derive(Debug, Clone)]
pub struct ScheduleWriter {
    path: PathBuf,
}

impl ScheduleWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn target_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Replace the document with `records`.
    pub fn write(&self, records: &[ScheduleRecord]) -> Result<usize, StorageError> {
        let dir = self.target_dir();
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            write_pretty(&mut writer, records)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        debug!("Serialized {} records to {:?}", records.len(), temp.path());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }

        temp.persist(&self.path)?;
        info!("Wrote {} records to {:?}", records.len(), self.path);

        Ok(records.len())
    }

    /// Read the current document back.
    pub fn read(&self) -> Result<Vec<ScheduleRecord>, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::PathNotFound(self.path.clone()));
        }
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(course: &str) -> ScheduleRecord {
        ScheduleRecord {
            course_number: course.to_string(),
            instructors: Some("Smith".to_string()),
            days: Some("TR".to_string()),
            time_of_day: Some("1:30 PM-2:45 PM".to_string()),
            duration: Some(75),
            location: Some("LIB 105".to_string()),
            class_type: Some("Lecture".to_string()),
            notes: None,
            anticipated_enrollment: None,
        }
    }

    #[test]
    fn test_four_space_indent() {
        let text = to_json_string(&[record("CS 1400")]).unwrap();
        let expected = r#"[
    {
        "course_number": "CS 1400",
        "instructors": "Smith",
        "days": "TR",
        "time_of_day": "1:30 PM-2:45 PM",
        "duration": 75,
        "location": "LIB 105",
        "type": "Lecture"
    }
]"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(to_json_string(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_write_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ScheduleWriter::new(temp_dir.path().join("nested/S26schedule.json"));

        let records = vec![record("A"), record("B")];
        assert_eq!(writer.write(&records).unwrap(), 2);

        let read = writer.read().unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("S26schedule.json");
        let writer = ScheduleWriter::new(&path);

        writer.write(&[record("A")]).unwrap();
        let first = std::fs::read(&path).unwrap();
        writer.write(&[record("A")]).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ScheduleWriter::new(temp_dir.path().join("out.json"));
        writer.write(&[record("A")]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_read_missing() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ScheduleWriter::new(temp_dir.path().join("missing.json"));
        assert!(matches!(writer.read(), Err(StorageError::PathNotFound(_))));
    }

    #[test]
    fn test_bare_filename_targets_current_dir() {
        let writer = ScheduleWriter::new("S26schedule.json");
        assert_eq!(writer.target_dir(), Path::new("."));
    }
}
