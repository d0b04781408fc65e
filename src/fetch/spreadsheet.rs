//! Local spreadsheet files.
//!
//! Excel and OpenDocument workbooks are read with calamine; `.csv` files with
//! the csv crate. The first row is the header row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, info};

use super::{ensure_unique_headers, RowSource, SourceError};
use crate::models::{CellValue, SourceTable};

/// Workbook extensions calamine can open.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A schedule stored in a local spreadsheet file.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
    /// Worksheet to read; the first one when unset.
    sheet: Option<String>,
}

impl SpreadsheetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: None,
        }
    }

    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file synchronously.
    pub fn read(&self) -> Result<SourceTable, SourceError> {
        if !self.path.is_file() {
            return Err(SourceError::NotFound(self.path.clone()));
        }

        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let table = if extension == "csv" {
            self.read_csv()?
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            self.read_workbook()?
        } else {
            return Err(SourceError::UnsupportedFormat(self.path.display().to_string()));
        };

        ensure_unique_headers(&table.headers)?;
        info!("Read {} rows from {:?}", table.len(), self.path);
        Ok(table)
    }

    fn read_workbook(&self) -> Result<SourceTable, SourceError> {
        let mut workbook = open_workbook_auto(&self.path)?;

        let sheet_name = match &self.sheet {
            Some(name) => {
                if !workbook.sheet_names().contains(name) {
                    return Err(SourceError::WorksheetNotFound(name.clone()));
                }
                name.clone()
            }
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| SourceError::WorksheetNotFound("<first sheet>".to_string()))?,
        };

        debug!("Reading worksheet '{}'", sheet_name);
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(|cell| cell.to_string()).collect(),
            None => return Ok(SourceTable::default()),
        };

        let grid: Vec<Vec<CellValue>> = rows
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        Ok(SourceTable::from_grid(headers, grid))
    }

    fn read_csv(&self) -> Result<SourceTable, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut grid = Vec::new();
        for record in reader.records() {
            let record = record?;
            grid.push(record.iter().map(CellValue::numericise).collect());
        }

        Ok(SourceTable::from_grid(headers, grid))
    }
}

/// Convert a calamine cell. Error cells (`#N/A`, `#REF!`) read as empty.
fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::text(other.to_string()),
    }
}

#[async_trait]
impl RowSource for SpreadsheetSource {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn describe(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("'{}' (sheet '{}')", self.path.display(), sheet),
            None => format!("'{}'", self.path.display()),
        }
    }

    async fn load(&self) -> Result<SourceTable, SourceError> {
        self.read()
    }
}
