use serde::{Deserialize, Serialize};
use serde_json::Value;

// https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values#ValueRange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Omitted by the API when the range holds no data.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

// https://developers.google.com/sheets/api/reference/rest/v4/UpdateValuesResponse
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_rows: Option<u32>,
    #[serde(default)]
    pub updated_cells: Option<u32>,
}

// https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/append#response-body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: Option<UpdateValuesResponse>,
}

// https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/clear#response-body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearValuesResponse {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub cleared_range: Option<String>,
}

/// `spreadsheets.get` restricted to the fields used for the access check.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetMetadata {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub properties: Option<SpreadsheetTitle>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpreadsheetTitle {
    #[serde(default)]
    pub title: Option<String>,
}

/// Google's error envelope: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub(crate) message: Option<String>,
}
