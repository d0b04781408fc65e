//! Row sources.
//!
//! A source produces a [`SourceTable`]: the header row plus every data row,
//! in sheet order. Local spreadsheet files and Google Sheets worksheets both
//! implement [`RowSource`], so the ingest pipeline does not care where the
//! rows came from.

pub mod credentials;
pub mod sheets;
pub mod spreadsheet;

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::SourceTable;

pub use credentials::ServiceAccountKey;
pub use sheets::{SheetsClient, SheetsConfig, SheetsError, SheetsSource};
pub use spreadsheet::SpreadsheetSource;

/// Errors that can occur while loading rows.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("The file '{}' was not found", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Worksheet not found: {0}")]
    WorksheetNotFound(String),

    #[error("Duplicate column header: {0}")]
    DuplicateHeader(String),

    #[error(transparent)]
    Sheets(#[from] SheetsError),
}

/// Anything that can supply schedule rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Source identifier for logging.
    fn name(&self) -> &'static str;

    /// Human-readable location of the rows (file path, sheet title).
    fn describe(&self) -> String;

    /// Load the full table.
    async fn load(&self) -> Result<SourceTable, SourceError>;
}

/// Reject header rows that name the same column twice.
pub fn ensure_unique_headers(headers: &[String]) -> Result<(), SourceError> {
    let mut seen = HashSet::new();
    for header in headers.iter().filter(|h| !h.is_empty()) {
        if !seen.insert(header.as_str()) {
            return Err(SourceError::DuplicateHeader(header.clone()));
        }
    }
    Ok(())
}

/// A fixed table held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    table: SourceTable,
}

impl InMemorySource {
    pub fn new(table: SourceTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl RowSource for InMemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.table.len())
    }

    async fn load(&self) -> Result<SourceTable, SourceError> {
        Ok(self.table.clone())
    }
}
