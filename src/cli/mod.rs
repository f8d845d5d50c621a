mod auth;
mod show;
mod tx;

use crate::error::Result;
use clap::{Parser, Subcommand};

pub use auth::AuthAction;
pub use show::ShowResource;
pub use tx::TxAction;

#[derive(Parser, Debug)]
#[command(name = "sheet-ledger")]
#[command(about = "Keep a ledger of sales and expenses in Google Sheets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Auth { action } => action.execute().await,
            Commands::Tx { action } => action.execute().await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in to or out of Google Sheets
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Read and change transactions
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
