//! In-memory stand-in for the Sheets API with the same range semantics.

use super::types::{
    AppendValuesResponse, ClearValuesResponse, SpreadsheetMetadata, SpreadsheetTitle,
    UpdateValuesResponse, ValueRange,
};
use super::{RowSpan, SheetTransport};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use google_sheets4::api::{BatchUpdateSpreadsheetResponse, Request};
use serde_json::Value;
use std::sync::{Arc, Mutex};

const SPREADSHEET_ID: &str = "sheet_123";

/// A write the fake received, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecordedWrite {
    Update(RowSpan),
    Append,
    Clear(RowSpan),
    /// Zero-based, end-exclusive, as sent in `deleteDimension`.
    DeleteRows { start: i32, end: i32 },
    Format,
}

#[derive(Clone, Default)]
pub(crate) struct InMemorySheet {
    pub grid: Arc<Mutex<Vec<Vec<Value>>>>,
    pub writes: Arc<Mutex<Vec<RecordedWrite>>>,
    pub reads: Arc<Mutex<usize>>,
    reads_fail: Arc<Mutex<bool>>,
}

impl InMemorySheet {
    pub(crate) fn with_rows(rows: Vec<Vec<Value>>) -> Self {
        Self {
            grid: Arc::new(Mutex::new(rows)),
            ..Default::default()
        }
    }

    pub(crate) fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn rows(&self) -> Vec<Vec<Value>> {
        self.grid.lock().unwrap().clone()
    }

    /// Simulate a collaborator editing the sheet by hand.
    pub(crate) fn insert_row(&self, index: usize, row: Vec<Value>) {
        self.grid.lock().unwrap().insert(index, row);
    }

    /// Make every later read fail, as when the network drops after a write.
    pub(crate) fn fail_reads(&self) {
        *self.reads_fail.lock().unwrap() = true;
    }

    fn record(&self, write: RecordedWrite) {
        self.writes.lock().unwrap().push(write);
    }
}

fn is_blank(row: &[Value]) -> bool {
    row.iter()
        .all(|cell| matches!(cell, Value::Null) || cell.as_str() == Some(""))
}

/// Like the API, trailing blank cells and rows are trimmed from reads.
fn trimmed(rows: &[Vec<Value>]) -> Vec<Vec<Value>> {
    let mut rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            while row.last().is_some_and(|c| is_blank(std::slice::from_ref(c))) {
                row.pop();
            }
            row
        })
        .collect();
    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    rows
}

fn bounds(span: RowSpan, len: usize) -> (usize, usize) {
    let start = span.first.map(|r| r as usize - 1).unwrap_or(0);
    let end = span.last.map(|r| r as usize).unwrap_or(len).max(start);
    (start, end)
}

#[async_trait]
impl SheetTransport for InMemorySheet {
    async fn get_values(&self, span: RowSpan) -> Result<ValueRange> {
        *self.reads.lock().unwrap() += 1;
        if *self.reads_fail.lock().unwrap() {
            return Err(AppError::Transport("Sheet unavailable".to_string()));
        }
        let grid = self.grid.lock().unwrap();
        let (start, end) = bounds(span, grid.len());
        let end = end.min(grid.len());
        let values = match start < end {
            true => trimmed(&grid[start..end]),
            false => Vec::new(),
        };

        Ok(ValueRange {
            range: Some(span.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values,
        })
    }

    async fn update_values(
        &self,
        span: RowSpan,
        rows: Vec<Vec<Value>>,
    ) -> Result<UpdateValuesResponse> {
        self.record(RecordedWrite::Update(span));
        let mut grid = self.grid.lock().unwrap();
        let (start, _) = bounds(span, grid.len());
        let updated_rows = rows.len() as u32;

        for (offset, row) in rows.into_iter().enumerate() {
            let index = start + offset;
            if grid.len() <= index {
                grid.resize(index + 1, Vec::new());
            }
            grid[index] = row;
        }

        Ok(UpdateValuesResponse {
            spreadsheet_id: SPREADSHEET_ID.to_string(),
            updated_range: Some(span.to_string()),
            updated_rows: Some(updated_rows),
            updated_cells: None,
        })
    }

    async fn append_values(
        &self,
        _span: RowSpan,
        rows: Vec<Vec<Value>>,
    ) -> Result<AppendValuesResponse> {
        self.record(RecordedWrite::Append);
        let mut grid = self.grid.lock().unwrap();

        // The table ends at the last row holding any value
        let mut insert_at = grid
            .iter()
            .rposition(|row| !is_blank(row))
            .map(|i| i + 1)
            .unwrap_or(0);
        let first_row = insert_at as u32 + 1;
        for row in rows {
            grid.insert(insert_at, row);
            insert_at += 1;
        }

        Ok(AppendValuesResponse {
            spreadsheet_id: SPREADSHEET_ID.to_string(),
            table_range: None,
            updates: Some(UpdateValuesResponse {
                spreadsheet_id: SPREADSHEET_ID.to_string(),
                updated_range: Some(RowSpan::row(first_row).to_string()),
                updated_rows: Some(1),
                updated_cells: None,
            }),
        })
    }

    async fn clear_values(&self, span: RowSpan) -> Result<ClearValuesResponse> {
        self.record(RecordedWrite::Clear(span));
        let mut grid = self.grid.lock().unwrap();
        let (start, end) = bounds(span, grid.len());
        let end = end.min(grid.len());
        for row in grid.iter_mut().take(end).skip(start) {
            row.clear();
        }

        Ok(ClearValuesResponse {
            spreadsheet_id: SPREADSHEET_ID.to_string(),
            cleared_range: Some(span.to_string()),
        })
    }

    async fn batch_update(
        &self,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateSpreadsheetResponse> {
        let mut grid = self.grid.lock().unwrap();

        for request in requests {
            let Some(delete) = request.delete_dimension else {
                self.record(RecordedWrite::Format);
                continue;
            };
            let range = delete
                .range
                .ok_or_else(|| AppError::Transport("Missing range".to_string()))?;
            let (start, end) = match (range.start_index, range.end_index) {
                (Some(start), Some(end)) if start >= 0 && start <= end => (start, end),
                _ => return Err(AppError::Transport("Invalid range".to_string())),
            };
            self.record(RecordedWrite::DeleteRows { start, end });

            let len = grid.len();
            let start = (start as usize).min(len);
            let end = (end as usize).min(len);
            grid.drain(start..end);
        }

        Ok(BatchUpdateSpreadsheetResponse {
            spreadsheet_id: Some(SPREADSHEET_ID.to_string()),
            ..Default::default()
        })
    }

    async fn get_metadata(&self) -> Result<SpreadsheetMetadata> {
        Ok(SpreadsheetMetadata {
            spreadsheet_id: SPREADSHEET_ID.to_string(),
            properties: Some(SpreadsheetTitle {
                title: Some("Ledger".to_string()),
            }),
        })
    }
}
