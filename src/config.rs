use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_PREFIX: &str = "sheet-ledger";

pub(crate) const CLIENT_ID_PLACEHOLDER: &str = "YOUR_OAUTH_CLIENT_ID_HERE";
pub(crate) const SHEET_ID_PLACEHOLDER: &str = "YOUR_SPREADSHEET_ID_HERE";
pub(crate) const API_KEY_PLACEHOLDER: &str = "YOUR_GOOGLE_API_KEY_HERE";

const ENV_CLIENT_ID: &str = "SHEET_LEDGER_OAUTH_CLIENT_ID";
const ENV_SHEET_ID: &str = "SHEET_LEDGER_SHEET_ID";
const ENV_API_KEY: &str = "SHEET_LEDGER_API_KEY";

const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/";
const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleConfig {
    #[serde(default = "client_id_placeholder")]
    pub client_id: String,
    #[serde(default = "sheet_id_placeholder")]
    pub sheet_id: String,
    /// Only needed for read-only access without signing in.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Where the provider sends the browser back to after consent.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: client_id_placeholder(),
            sheet_id: sheet_id_placeholder(),
            api_key: None,
            redirect_url: default_redirect_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn client_id_placeholder() -> String {
    CLIENT_ID_PLACEHOLDER.to_string()
}

fn sheet_id_placeholder() -> String {
    SHEET_ID_PLACEHOLDER.to_string()
}

fn default_redirect_url() -> String {
    DEFAULT_REDIRECT_URL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Returns true when a value was never filled in.
pub(crate) fn is_unset(value: &str, placeholder: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == placeholder
}

impl GoogleConfig {
    /// Check that the sheet id is set. Required by every access mode.
    pub fn validate_sheet(&self) -> Result<()> {
        if is_unset(&self.sheet_id, SHEET_ID_PLACEHOLDER) {
            return Err(AppError::Config(format!(
                "Spreadsheet ID is not configured. Please set {} or google.sheet_id",
                ENV_SHEET_ID
            )));
        }
        Ok(())
    }

    /// Check everything the OAuth2 sign-in flow needs.
    pub fn validate_oauth(&self) -> Result<()> {
        if is_unset(&self.client_id, CLIENT_ID_PLACEHOLDER) {
            return Err(AppError::Config(format!(
                "OAuth client ID is not configured. Please set {} or google.client_id",
                ENV_CLIENT_ID
            )));
        }
        self.validate_sheet()
    }

    /// Check everything read-only API key access needs, returning the key.
    pub fn validate_api_key(&self) -> Result<&str> {
        let key = self
            .api_key
            .as_deref()
            .filter(|key| !is_unset(key, API_KEY_PLACEHOLDER))
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Google Sheets API key is not configured. Please set {} or google.api_key",
                    ENV_API_KEY
                ))
            })?;
        self.validate_sheet()?;
        Ok(key)
    }
}

impl Config {
    /// Load the config file if there is one, then apply environment overrides.
    ///
    /// Validation is left to the caller so that an unconfigured setup can still
    /// be reported instead of aborting.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        let config = match config_path.exists() {
            true => {
                let contents = fs::read_to_string(&config_path)?;
                toml::from_str(&contents)
                    .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?
            }
            false => Config::default(),
        };

        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply overrides looked up by environment variable name.
    pub(crate) fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.google.client_id = client_id;
        }
        if let Some(sheet_id) = lookup(ENV_SHEET_ID) {
            self.google.sheet_id = sheet_id;
        }
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.google.api_key = Some(api_key);
        }
        self
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the cache directory path
    pub fn cache_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_cache_home()
            .ok_or_else(|| AppError::Config("Failed to determine cache directory".to_string()))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create cache file path: {}", e)))
    }
}
