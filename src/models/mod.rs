pub mod transaction;

pub use transaction::{
    FromSheetRows, SheetRecord, ToSheetRow, Transaction, TransactionDraft, TransactionType,
};
