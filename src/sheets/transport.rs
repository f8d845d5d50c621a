use super::types::{
    ApiErrorBody, AppendValuesResponse, ClearValuesResponse, SpreadsheetMetadata,
    UpdateValuesResponse, ValueRange,
};
use super::{RowSpan, SheetTransport};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::oauth::AccessToken;
use async_trait::async_trait;
use google_sheets4::api::{
    BatchUpdateSpreadsheetRequest, BatchUpdateSpreadsheetResponse, ClearValuesRequest, Request,
};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// How a request proves it may touch the spreadsheet.
#[derive(Clone)]
pub enum Authorizer {
    /// OAuth2 access token; full read/write.
    Bearer(AccessToken),
    /// Static API key; the sheet must be shared for reading.
    ApiKey(String),
}

impl Authorizer {
    pub fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self {
            Authorizer::Bearer(token) => {
                if token.is_expired() {
                    return Err(AppError::Auth(
                        "Access token has expired. Please sign in again".to_string(),
                    ));
                }
                Ok(request.bearer_auth(&token.secret))
            }
            Authorizer::ApiKey(key) => Ok(request.query(&[("key", key)])),
        }
    }

    fn validate(&self) -> Result<()> {
        let secret = match self {
            Authorizer::Bearer(token) => &token.secret,
            Authorizer::ApiKey(key) => key,
        };
        if secret.trim().is_empty() {
            return Err(AppError::Config("Missing credential".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authorizer::Bearer(token) => f.debug_tuple("Bearer").field(token).finish(),
            Authorizer::ApiKey(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
        }
    }
}

/// Sheets v4 over HTTPS for a single spreadsheet.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    authorizer: Authorizer,
}

impl HttpTransport {
    pub fn new(config: &Config, authorizer: Authorizer) -> Result<Self> {
        config.google.validate_sheet()?;
        authorizer.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = format!(
            "{}/{}",
            config.google.api_base_url.trim_end_matches('/'),
            config.google.sheet_id.trim()
        );

        Ok(Self {
            client,
            base_url,
            authorizer,
        })
    }

    fn values_url(&self, span: RowSpan, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/values/{}:{}", self.base_url, span, action),
            None => format!("{}/values/{}", self.base_url, span),
        }
    }

    async fn execute<R: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<R> {
        let request = self
            .authorizer
            .authorize(request)?
            .header(ACCEPT, "application/json");

        let response = request.send().await.map_err(|e| {
            // The URL may carry an API key
            AppError::Transport(format!("Failed to {}: {}", what, e.without_url()))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::Transport(format!(
                "Failed to read response to {}: {}",
                what,
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            return Err(normalize_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::Transport(format!("Unexpected response to {}: {}", what, e))
        })
    }
}

/// Collapse a failed response into one descriptive error.
///
/// Prefers the provider's own message, falling back to the status line. A 401
/// means the credential is no longer accepted.
pub(crate) fn normalize_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|body| body.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )
        });

    match status {
        StatusCode::UNAUTHORIZED => AppError::Auth(message),
        _ => AppError::Transport(message),
    }
}

fn rows_body(span: RowSpan, rows: Vec<Vec<Value>>) -> ValueRange {
    ValueRange {
        range: Some(span.to_string()),
        major_dimension: Some("ROWS".to_string()),
        values: rows,
    }
}

#[async_trait]
impl SheetTransport for HttpTransport {
    #[instrument(name = "Reading values", skip(self))]
    async fn get_values(&self, span: RowSpan) -> Result<ValueRange> {
        let url = self.values_url(span, None);
        debug!(%url, "GET");

        let request = self.client.get(&url).query(&[
            ("majorDimension", "ROWS"),
            ("valueRenderOption", "UNFORMATTED_VALUE"),
            ("dateTimeRenderOption", "FORMATTED_STRING"),
        ]);
        self.execute(request, "read values").await
    }

    #[instrument(name = "Writing values", skip(self, rows))]
    async fn update_values(
        &self,
        span: RowSpan,
        rows: Vec<Vec<Value>>,
    ) -> Result<UpdateValuesResponse> {
        let url = self.values_url(span, None);
        debug!(%url, "PUT");

        let request = self
            .client
            .put(&url)
            .query(&[("valueInputOption", "RAW")])
            .json(&rows_body(span, rows));
        self.execute(request, "write values").await
    }

    #[instrument(name = "Appending values", skip(self, rows))]
    async fn append_values(
        &self,
        span: RowSpan,
        rows: Vec<Vec<Value>>,
    ) -> Result<AppendValuesResponse> {
        let url = self.values_url(span, Some("append"));
        debug!(%url, "POST");

        let request = self
            .client
            .post(&url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&rows_body(span, rows));
        self.execute(request, "append values").await
    }

    #[instrument(name = "Clearing values", skip(self))]
    async fn clear_values(&self, span: RowSpan) -> Result<ClearValuesResponse> {
        let url = self.values_url(span, Some("clear"));
        debug!(%url, "POST");

        let request = self.client.post(&url).json(&ClearValuesRequest::default());
        self.execute(request, "clear values").await
    }

    #[instrument(name = "Updating spreadsheet", skip_all, fields(requests = requests.len()))]
    async fn batch_update(&self, requests: Vec<Request>) -> Result<BatchUpdateSpreadsheetResponse> {
        let url = format!("{}:batchUpdate", self.base_url);
        debug!(%url, "POST");

        let body = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };
        let request = self.client.post(&url).json(&body);
        self.execute(request, "update spreadsheet").await
    }

    #[instrument(name = "Fetching spreadsheet metadata", skip(self))]
    async fn get_metadata(&self) -> Result<SpreadsheetMetadata> {
        debug!(url = %self.base_url, "GET");

        let request = self
            .client
            .get(&self.base_url)
            .query(&[("fields", "spreadsheetId,properties.title")]);
        self.execute(request, "read spreadsheet").await
    }
}
