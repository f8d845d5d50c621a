use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or placeholder credentials / sheet identifier.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider returned an error instead of a token, or no usable credential.
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success response or malformed payload from the Sheets API.
    #[error("Google Sheets request failed: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
