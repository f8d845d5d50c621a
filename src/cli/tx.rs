use crate::config::Config;
use crate::error::Result;
use crate::models::{Transaction, TransactionDraft, TransactionType};
use crate::oauth::TokenStore;
use crate::session::Ledger;
use crate::sheets::SheetTransport;
use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use dialoguer::Confirm;
use rust_decimal::Decimal;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Subcommand, Debug)]
pub enum TxAction {
    /// List every transaction in the spreadsheet
    List {
        /// Read with the configured API key instead of a signed-in token
        #[arg(long)]
        api_key: bool,
    },
    /// Record a new transaction
    Add {
        #[command(flatten)]
        fields: TransactionFields,
    },
    /// Replace the fields of an existing transaction
    Update {
        id: String,
        #[command(flatten)]
        fields: TransactionFields,
    },
    Delete { id: String },
    /// Delete every transaction, keeping the header row
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write and format the header row
    Init,
}

#[derive(Args, Debug)]
pub struct TransactionFields {
    /// Date in YYYY-MM-DD form
    #[arg(long, value_parser = parse_date)]
    date: String,
    #[arg(long, allow_hyphen_values = true)]
    amount: Decimal,
    #[arg(long = "type", value_enum)]
    type_: TransactionType,
    #[arg(long)]
    quantity: Option<u32>,
    #[arg(long, default_value = "")]
    description: String,
}

impl TransactionFields {
    pub fn to_draft(&self) -> TransactionDraft {
        TransactionDraft {
            date: self.date.clone(),
            amount: self.amount,
            type_: self.type_,
            quantity: self.quantity,
            description: self.description.clone(),
        }
    }
}

fn parse_date(value: &str) -> std::result::Result<String, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

impl TxAction {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load()?;

        if let TxAction::List { api_key: true } = self {
            config.google.validate_api_key()?;
            let mut ledger = Ledger::open_read_only(config);
            return list(&mut ledger).await;
        }

        config.google.validate_oauth()?;
        let mut ledger = Ledger::open(config, TokenStore::persisted()?);

        match self {
            TxAction::List { .. } => list(&mut ledger).await,
            TxAction::Add { fields } => {
                let transaction = ledger.add(fields.to_draft()).await?;
                info!(id = %transaction.id, "Transaction added");
                Ok(())
            }
            TxAction::Update { id, fields } => {
                ledger.update(fields.to_draft().with_id(id.clone())).await?;
                info!(id = %id, "Transaction updated");
                Ok(())
            }
            TxAction::Delete { id } => {
                ledger.delete(id).await?;
                info!(id = %id, "Transaction deleted");
                Ok(())
            }
            TxAction::Clear { yes } => {
                if !yes && !confirm_clear()? {
                    info!("Nothing cleared");
                    return Ok(());
                }
                ledger.clear_all().await
            }
            TxAction::Init => ledger.initialize().await,
        }
    }
}

fn confirm_clear() -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt("Delete every transaction in the spreadsheet?")
        .default(false)
        .interact()
        .map_err(|e| anyhow!("Failed to read confirmation: {}", e))?;
    Ok(confirmed)
}

async fn list<T>(ledger: &mut Ledger<T>) -> Result<()>
where
    T: SheetTransport + Sync,
{
    let transactions = ledger.refresh().await?;
    if transactions.is_empty() {
        info!("No transactions");
        return Ok(());
    }

    println!(
        "{:<24} {:<10} {:>12} {:<8} {:>4}  DESCRIPTION",
        "ID", "DATE", "AMOUNT", "TYPE", "QTY"
    );
    for transaction in transactions {
        println!("{}", format_row(transaction));
    }
    Ok(())
}

fn format_row(transaction: &Transaction) -> String {
    format!(
        "{:<24} {:<10} {:>12} {:<8} {:>4}  {}",
        transaction.id,
        transaction.date,
        transaction.amount.to_string(),
        transaction.type_.to_string(),
        transaction
            .quantity
            .map(|q| q.to_string())
            .unwrap_or_default(),
        transaction.description
    )
}
