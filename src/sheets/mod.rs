mod adapter;
#[cfg(test)]
pub(crate) mod fake;
mod formatting;
mod transport;
pub mod types;

pub use adapter::SheetAdapter;
pub use transport::{Authorizer, HttpTransport};

use crate::error::Result;
use async_trait::async_trait;
use google_sheets4::api::{BatchUpdateSpreadsheetResponse, Request};
use serde_json::Value;
use std::fmt;
use types::{
    AppendValuesResponse, ClearValuesResponse, SpreadsheetMetadata, UpdateValuesResponse,
    ValueRange,
};

const FIRST_COLUMN: &str = "A";
const LAST_COLUMN: &str = "F";

/// A band of whole rows across the six data columns, in 1-based row numbers.
///
/// `None` leaves that end of the band open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub first: Option<u32>,
    pub last: Option<u32>,
}

impl RowSpan {
    pub const fn all() -> Self {
        Self {
            first: None,
            last: None,
        }
    }

    pub const fn row(row: u32) -> Self {
        Self {
            first: Some(row),
            last: Some(row),
        }
    }

    pub const fn from_row(row: u32) -> Self {
        Self {
            first: Some(row),
            last: None,
        }
    }
}

/// A1 notation, e.g. `A:F`, `A2:F`, `A5:F5`.
impl fmt::Display for RowSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first.map(|r| r.to_string()).unwrap_or_default();
        let last = self.last.map(|r| r.to_string()).unwrap_or_default();
        write!(f, "{FIRST_COLUMN}{first}:{LAST_COLUMN}{last}")
    }
}

/// The range-addressable operations of the remote store.
#[async_trait]
pub trait SheetTransport {
    async fn get_values(&self, span: RowSpan) -> Result<ValueRange>;

    async fn update_values(
        &self,
        span: RowSpan,
        rows: Vec<Vec<Value>>,
    ) -> Result<UpdateValuesResponse>;

    async fn append_values(
        &self,
        span: RowSpan,
        rows: Vec<Vec<Value>>,
    ) -> Result<AppendValuesResponse>;

    async fn clear_values(&self, span: RowSpan) -> Result<ClearValuesResponse>;

    async fn batch_update(&self, requests: Vec<Request>) -> Result<BatchUpdateSpreadsheetResponse>;

    async fn get_metadata(&self) -> Result<SpreadsheetMetadata>;
}
