use crate::config::Config;
use crate::error::Result;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration and cache paths
    Paths,
    /// Show the spreadsheet and redirect settings in effect
    Config,
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
            ShowResource::Config => show_config(),
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    let cache_dir = Config::cache_dir()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?cache_dir, "Cache path");

    Ok(())
}

fn show_config() -> Result<()> {
    let config = Config::load()?;
    let google = &config.google;

    info!(
        sheet_id = %google.sheet_id,
        configured = google.validate_sheet().is_ok(),
        "Spreadsheet"
    );
    info!(
        redirect_url = %google.redirect_url,
        configured = google.validate_oauth().is_ok(),
        "OAuth sign-in"
    );
    info!(configured = google.validate_api_key().is_ok(), "API key");

    Ok(())
}
