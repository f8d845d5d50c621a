use super::formatting::{LEDGER_SHEET_ID, delete_row_request, header_format_requests};
use super::{Authorizer, HttpTransport, RowSpan, SheetTransport};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::transaction::{find_row, header_row};
use crate::models::{FromSheetRows, SheetRecord, ToSheetRow, Transaction};
use tracing::{debug, info, instrument, warn};

/// Typed CRUD over the six-column ledger range.
///
/// The sheet has no key index, so update and delete first re-read the whole
/// range to find the record's current row, then write to that row. Nothing
/// stops another writer from moving rows in between; such a write lands on
/// whatever now occupies the row (last write wins).
pub struct SheetAdapter<T> {
    transport: T,
}

impl SheetAdapter<HttpTransport> {
    /// Connect with a snapshot of the credential; later sign-ins need a new adapter.
    pub fn connect(config: &Config, authorizer: Authorizer) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config, authorizer)?))
    }
}

impl<T> SheetAdapter<T>
where
    T: SheetTransport + Sync,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Every live transaction in physical row order, tagged with its row.
    #[instrument(name = "Reading transactions", skip_all)]
    pub async fn list_records(&self) -> Result<Vec<SheetRecord>> {
        let range = self.transport.get_values(RowSpan::all()).await?;
        let records = Transaction::from_sheet_rows(&range.values);
        debug!(count = records.len(), "Read transactions");
        Ok(records)
    }

    pub async fn list_all(&self) -> Result<Vec<Transaction>> {
        Ok(self
            .list_records()
            .await?
            .into_iter()
            .map(|record| record.transaction)
            .collect())
    }

    /// Append as a new last row. The caller supplies the identifier.
    #[instrument(name = "Adding transaction", skip_all, fields(id = %transaction.id))]
    pub async fn add(&self, transaction: &Transaction) -> Result<()> {
        if transaction.id.trim().is_empty() {
            return Err(AppError::Config(
                "Transactions need an identifier before they are stored".to_string(),
            ));
        }

        let response = self
            .transport
            .append_values(RowSpan::all(), vec![transaction.to_sheet_row()])
            .await?;
        let updated_range = response.updates.and_then(|u| u.updated_range);
        info!(?updated_range, "Transaction added");
        Ok(())
    }

    #[instrument(name = "Updating transaction", skip(self, transaction))]
    pub async fn update(&self, id: &str, transaction: &Transaction) -> Result<()> {
        let row = self.locate(id).await?;

        self.transport
            .update_values(RowSpan::row(row), vec![transaction.to_sheet_row()])
            .await?;
        info!(row, "Transaction updated");
        Ok(())
    }

    /// Removes the row outright, so every row below moves up by one.
    #[instrument(name = "Deleting transaction", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let row = self.locate(id).await?;

        self.transport
            .batch_update(vec![delete_row_request(LEDGER_SHEET_ID, row)])
            .await?;
        info!(row, "Transaction deleted");
        Ok(())
    }

    /// Blank every data cell, keeping the header row.
    #[instrument(name = "Clearing transactions", skip_all)]
    pub async fn clear_all(&self) -> Result<()> {
        self.transport.clear_values(RowSpan::from_row(2)).await?;
        info!("All transactions cleared");
        Ok(())
    }

    /// Write the header labels and format the header row.
    #[instrument(name = "Initializing spreadsheet", skip_all)]
    pub async fn initialize(&self) -> Result<()> {
        self.transport
            .update_values(RowSpan::row(1), vec![header_row()])
            .await?;
        self.transport
            .batch_update(header_format_requests(LEDGER_SHEET_ID))
            .await?;
        info!("Spreadsheet initialized with headers");
        Ok(())
    }

    /// Whether the spreadsheet can be reached with the current credential.
    pub async fn check_access(&self) -> bool {
        match self.transport.get_metadata().await {
            Ok(metadata) => {
                let title = metadata.properties.and_then(|p| p.title);
                debug!(?title, "Spreadsheet is reachable");
                true
            }
            Err(e) => {
                warn!("Spreadsheet access check failed: {}", e);
                false
            }
        }
    }

    /// Current physical row of `id`, freshly read. Rows that fail to parse still count.
    async fn locate(&self, id: &str) -> Result<u32> {
        let range = self.transport.get_values(RowSpan::all()).await?;
        find_row(&range.values, id)
            .ok_or_else(|| AppError::NotFound(format!("Transaction '{}' not found", id)))
    }
}
