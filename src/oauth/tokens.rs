use crate::config::Config;
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const TOKEN_FILE: &str = "google_token.json";
const PENDING_STATE_FILE: &str = "pending_state";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub secret: String,
    /// Absent when the provider did not advertise a lifetime.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        Self {
            secret: secret.into(),
            // A lifetime too large to represent is treated as unadvertised
            expires_at: expires_in_secs
                .and_then(Duration::try_seconds)
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime)),
        }
    }

    /// Implicit-grant tokens cannot be refreshed, so expiry is terminal.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Safe to log.
    pub fn redacted(&self) -> String {
        let prefix: String = self.secret.chars().take(10).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &self.redacted())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Holds the active credential and the anti-replay state of an outstanding redirect.
///
/// When backed by a directory, both survive a process restart until sign-out.
#[derive(Debug, Default)]
pub struct TokenStore {
    dir: Option<PathBuf>,
    current: Option<AccessToken>,
}

impl TokenStore {
    /// A store that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store persisted in the user's cache directory.
    pub fn persisted() -> Result<Self> {
        let token_path = Config::cache_file(TOKEN_FILE)?;
        let dir = token_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| AppError::Config("Failed to determine cache directory".to_string()))?;
        Self::in_dir(dir)
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            dir: Some(dir.into()),
            current: None,
        };
        store.current = store.load_token()?;
        Ok(store)
    }

    pub fn current(&self) -> Option<&AccessToken> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.as_ref().is_some_and(|token| !token.is_expired())
    }

    pub fn set(&mut self, token: AccessToken) -> Result<()> {
        if let Some(path) = self.path(TOKEN_FILE) {
            let contents = serde_json::to_string_pretty(&token)?;
            write_private(&path, &contents)?;
        }
        debug!(token = %token.redacted(), "Stored access token");
        self.current = Some(token);
        Ok(())
    }

    #[instrument(name = "Clearing Google Sheets token", skip_all)]
    pub fn clear(&mut self) -> Result<()> {
        self.current = None;
        if let Some(path) = self.path(TOKEN_FILE) {
            remove_if_exists(&path)?;
        }
        self.take_pending_state()?;
        debug!("Cleared Google Sheets token");
        Ok(())
    }

    /// Remember the `state` sent with an authorization redirect.
    pub fn remember_pending_state(&self, state: &str) -> Result<()> {
        match self.path(PENDING_STATE_FILE) {
            Some(path) => write_private(&path, state),
            None => Ok(()),
        }
    }

    /// Take the remembered `state`, if any, so it can only be matched once.
    pub fn take_pending_state(&self) -> Result<Option<String>> {
        let Some(path) = self.path(PENDING_STATE_FILE) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let state = fs::read_to_string(&path)
            .map_err(|e| AppError::Auth(format!("Failed to read pending state: {}", e)))?;
        remove_if_exists(&path)?;
        Ok(Some(state.trim().to_string()))
    }

    fn path(&self, filename: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(filename))
    }

    fn load_token(&self) -> Result<Option<AccessToken>> {
        let Some(path) = self.path(TOKEN_FILE) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| AppError::Auth(format!("Failed to read token file: {}", e)))?;
        let token: AccessToken = serde_json::from_str(&contents)?;

        Ok(Some(token))
    }
}

fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Auth(format!("Failed to create token cache directory: {}", e))
        })?;
    }

    // Create file with owner-only permissions from the start
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| AppError::Auth(format!("Failed to create {:?}: {}", path, e)))?;

    file.write_all(contents.as_bytes())
        .map_err(|e| AppError::Auth(format!("Failed to write {:?}: {}", path, e)))?;

    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    fs::remove_file(path).map_err(|e| AppError::Auth(format!("Failed to delete {:?}: {}", path, e)))
}
