use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Header labels for row 1, in column order A..F.
pub const SHEET_HEADERS: [&str; 6] = ["ID", "Date", "Amount", "Type", "Quantity", "Description"];

/// Fields are declared in sheet column order; rows are deserialized by position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub type_: TransactionType,
    #[serde(default)]
    pub quantity: Option<u32>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Sale => write!(f, "sale"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

/// A transaction that has not been given an identifier yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub date: String,
    pub amount: Decimal,
    pub type_: TransactionType,
    pub quantity: Option<u32>,
    pub description: String,
}

impl TransactionDraft {
    pub fn with_id(self, id: String) -> Transaction {
        Transaction {
            id,
            date: self.date,
            amount: self.amount,
            type_: self.type_,
            quantity: self.quantity,
            description: self.description,
        }
    }
}

/// A transaction together with the physical (1-based) sheet row it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRecord {
    pub row: u32,
    pub transaction: Transaction,
}

pub trait FromSheetRows: Sized {
    /// Convert raw rows (row 1 is the header) into located records.
    ///
    /// Blank rows are skipped. So are rows whose cells cannot be parsed, with a
    /// warning; they stay reachable by id through [`find_row`].
    fn from_sheet_rows(rows: &[Vec<Value>]) -> Vec<SheetRecord>;
}

pub trait ToSheetRow {
    /// Convert to the six cells of a sheet row.
    fn to_sheet_row(&self) -> Vec<Value>;
}

impl FromSheetRows for Transaction {
    fn from_sheet_rows(rows: &[Vec<Value>]) -> Vec<SheetRecord> {
        let mut records = Vec::new();

        for (row_number, cells) in data_rows(rows) {
            let record = csv::StringRecord::from(cells);
            let parsed: std::result::Result<Transaction, csv::Error> = record.deserialize(None);
            match parsed {
                Ok(transaction) => records.push(SheetRecord {
                    row: row_number,
                    transaction,
                }),
                Err(e) => warn!(row = row_number, "Skipping unreadable row: {}", e),
            }
        }

        records
    }
}

/// Physical row (1-based) holding `id`, whether or not the rest of the row parses.
pub fn find_row(rows: &[Vec<Value>], id: &str) -> Option<u32> {
    data_rows(rows)
        .find(|(_, cells)| cells[0].trim() == id)
        .map(|(row_number, _)| row_number)
}

/// Non-blank data rows as six text cells, with their physical row numbers.
fn data_rows(rows: &[Vec<Value>]) -> impl Iterator<Item = (u32, Vec<String>)> + '_ {
    rows.iter().enumerate().skip(1).filter_map(|(idx, row)| {
        // Pad row with empty strings if needed; the API trims trailing blanks
        let mut cells: Vec<String> = row.iter().map(cell_text).collect();
        cells.resize(SHEET_HEADERS.len().max(cells.len()), String::new());
        cells.truncate(SHEET_HEADERS.len());

        match cells[0].trim().is_empty() {
            true => None,
            false => Some(((idx + 1) as u32, cells)),
        }
    })
}

impl ToSheetRow for Transaction {
    fn to_sheet_row(&self) -> Vec<Value> {
        // Send the amount as a number so the sheet can do arithmetic on it
        let amount = serde_json::Number::from_str(&self.amount.to_string())
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(self.amount.to_string()));

        vec![
            Value::String(self.id.clone()),
            Value::String(self.date.clone()),
            amount,
            Value::String(self.type_.to_string()),
            self.quantity
                .map(Value::from)
                .unwrap_or_else(|| Value::String(String::new())),
            Value::String(self.description.clone()),
        ]
    }
}

pub fn header_row() -> Vec<Value> {
    SHEET_HEADERS
        .iter()
        .map(|h| Value::String(h.to_string()))
        .collect()
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;
    use rust_decimal::prelude::dec;
    use serde_json::json;

    #[test]
    fn test_to_sheet_row() {
        let transaction = Transaction {
            quantity: Some(3),
            ..mock_transaction("tx_123", dec!(-12.34), TransactionType::Expense)
        };

        let row = transaction.to_sheet_row();
        assert_eq!(
            row,
            vec![
                json!("tx_123"),
                json!("2025-01-15"),
                json!(-12.34),
                json!("expense"),
                json!(3),
                json!("mock transaction: tx_123"),
            ]
        );
    }

    #[test]
    fn test_to_sheet_row_without_quantity() {
        let row = mock_transaction("tx_1", dec!(5), TransactionType::Sale).to_sheet_row();
        assert_eq!(row[3], json!("sale"));
        assert_eq!(row[4], json!(""));
    }

    #[test]
    fn test_from_sheet_rows_with_data() {
        let rows = vec![
            header_row(),
            vec![
                json!("tx_123"),
                json!("2025-01-15"),
                json!(-12.34),
                json!("expense"),
                json!(3),
                json!("Coffee beans"),
            ],
            text_row(&["tx_456", "2025-01-16", "100.00", "sale", "", "Market stall"]),
        ];

        let records = Transaction::from_sheet_rows(&rows);
        let expected = vec![
            SheetRecord {
                row: 2,
                transaction: Transaction {
                    id: "tx_123".to_string(),
                    date: "2025-01-15".to_string(),
                    amount: dec!(-12.34),
                    type_: TransactionType::Expense,
                    quantity: Some(3),
                    description: "Coffee beans".to_string(),
                },
            },
            SheetRecord {
                row: 3,
                transaction: Transaction {
                    id: "tx_456".to_string(),
                    date: "2025-01-16".to_string(),
                    amount: dec!(100.00),
                    type_: TransactionType::Sale,
                    quantity: None,
                    description: "Market stall".to_string(),
                },
            },
        ];
        assert_eq!(records, expected);
    }

    #[test]
    fn test_from_sheet_rows_empty() {
        let records = Transaction::from_sheet_rows(&[]);
        assert_eq!(records, vec![]);
    }

    #[test]
    fn test_from_sheet_rows_headers_only() {
        let records = Transaction::from_sheet_rows(&[header_row()]);
        assert_eq!(records, vec![]);
    }

    #[test]
    fn test_from_sheet_rows_skips_blank_rows_and_keeps_physical_row() {
        let rows = vec![
            header_row(),
            vec![],
            text_row(&["", "2025-01-01", "1", "sale"]),
            text_row(&["tx_9", "2025-01-02", "7.5", "sale"]),
        ];

        let records = Transaction::from_sheet_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row, 4);
        assert_eq!(records[0].transaction.id, "tx_9");
        assert_eq!(records[0].transaction.description, "");
    }

    #[test]
    fn test_from_sheet_rows_skips_malformed_row() {
        let rows = vec![
            header_row(),
            text_row(&["tx_hand", "2025-01-01", "twelve", "sale", "", "typed by hand"]),
            text_row(&["tx_2", "2025-01-02", "4", "refund", "", ""]),
            text_row(&["tx_3", "2025-01-03", "5", "sale", "", ""]),
        ];

        let records = Transaction::from_sheet_rows(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row, 4);
        assert_eq!(records[0].transaction.id, "tx_3");
    }

    #[test]
    fn test_find_row_includes_malformed_rows() {
        let rows = vec![
            header_row(),
            vec![],
            text_row(&["tx_hand", "2025-01-01", "twelve", "sale"]),
            text_row(&["tx_3", "2025-01-03", "5", "sale", "", ""]),
        ];

        assert_eq!(find_row(&rows, "tx_hand"), Some(3));
        assert_eq!(find_row(&rows, "tx_3"), Some(4));
        assert_eq!(find_row(&rows, "ID"), None);
        assert_eq!(find_row(&rows, "missing"), None);
    }

    #[test]
    fn test_from_sheet_rows_ignores_extra_columns() {
        let rows = vec![
            header_row(),
            text_row(&["tx_1", "2025-01-01", "3", "sale", "1", "desc", "note"]),
        ];

        let records = Transaction::from_sheet_rows(&rows);
        assert_eq!(records[0].transaction.description, "desc");
    }
}
