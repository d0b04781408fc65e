//! Input rows and the table they arrive in.

use std::collections::HashMap;

use super::CellValue;

/// One raw row: column name to cell value.
///
/// Columns the row source did not supply are simply absent; callers use
/// [`InputRow::get`] or [`InputRow::text`] and decide their own default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRow {
    cells: HashMap<String, CellValue>,
}

impl InputRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and in-memory sources.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Raw cell for a column, if the column exists in this row.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// String form of a column, `None` when the column is absent or blank.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(CellValue::as_text)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// True when every cell in the row is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for InputRow
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = InputRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// A header row plus the data rows read beneath it, in sheet order.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<InputRow>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<InputRow>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from a header row and positional cell rows.
    ///
    /// Headers are trimmed. Short rows are padded with empty cells, cells
    /// beyond the header width are dropped, and fully blank rows are skipped.
    pub fn from_grid<I>(headers: Vec<String>, grid: I) -> Self
    where
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

        let rows = grid
            .into_iter()
            .map(|cells| {
                let mut cells = cells.into_iter();
                headers
                    .iter()
                    .map(|h| (h, cells.next().unwrap_or_default()))
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, value)| (h.clone(), value))
                    .collect::<InputRow>()
            })
            .filter(|row| !row.is_blank())
            .collect();

        Self { headers, rows }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
