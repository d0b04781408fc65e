//! Ingestion pipeline.
//!
//! Loads rows from a [`RowSource`], normalizes them under a policy and
//! writes the schedule document. Output is written once, in full, or not at
//! all.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::fetch::{RowSource, SourceError};
use crate::models::{ScheduleRecord, SourceTable};
use crate::normalize::{normalize_table, NormalizeError, NormalizePolicy};
use crate::storage::{ScheduleWriter, StorageError};

/// Rows shown in the debug preview after loading.
const PREVIEW_ROWS: usize = 5;

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of an ingestion run.
#[derive(Debug)]
pub struct IngestResult {
    pub rows_read: usize,
    pub records: Vec<ScheduleRecord>,
    pub unscheduled: usize,
    /// Where the document was written; `None` on a dry run.
    pub output: Option<PathBuf>,
}

/// Run one conversion from `source` to `writer`.
pub async fn ingest(
    source: &dyn RowSource,
    policy: &NormalizePolicy,
    writer: &ScheduleWriter,
    dry_run: bool,
) -> Result<IngestResult, IngestError> {
    info!("Reading data from {}...", source.describe());
    let table = source.load().await?;
    preview(&table);

    info!("Calculating class durations...");
    let records = normalize_table(&table, policy)?;
    let unscheduled = records.iter().filter(|r| r.is_unscheduled()).count();

    let output = if dry_run {
        info!("Dry run: skipping write to {:?}", writer.path());
        None
    } else {
        writer.write(&records)?;
        Some(writer.path().to_path_buf())
    };

    Ok(IngestResult {
        rows_read: table.len(),
        records,
        unscheduled,
        output,
    })
}

fn preview(table: &SourceTable) {
    debug!(
        "Successfully loaded {} rows. Columns: {}",
        table.len(),
        table.headers.join(", ")
    );
    for (i, row) in table.rows.iter().take(PREVIEW_ROWS).enumerate() {
        let cells: Vec<String> = table
            .headers
            .iter()
            .filter_map(|h| row.get(h).map(|cell| format!("{}={}", h, cell)))
            .collect();
        debug!("  row {}: {}", i + 1, cells.join(" | "));
    }
}
