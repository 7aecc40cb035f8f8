// Data module for API descriptors, rows and response envelopes
// Author: Gabriel Demetrios Lafis

mod catalog;
mod date;
mod response;

pub use catalog::*;
pub use date::*;
pub use response::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// An untyped record returned by an analytics query. Key order follows the
/// upstream response.
pub type Row = serde_json::Map<String, JsonValue>;

/// Placeholder rendered for a cell with no value
pub const MISSING_CELL: &str = "-";

/// HTTP method used to query an API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Get
    }
}

/// Static descriptor of a queryable dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_options: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl ApiConfig {
    /// Query parameters declared in `additionalOptions.parameters`, if any
    pub fn default_parameters(&self) -> Option<&JsonValue> {
        self.additional_options
            .as_ref()
            .and_then(|opts| opts.get("parameters"))
            .filter(|params| params.as_object().map_or(false, |obj| !obj.is_empty()))
    }
}

/// Build the composite key identifying a selected column
pub fn column_key(api_id: &str, column_name: &str) -> String {
    format!("{}_{}", api_id, column_name)
}

/// Look a column up in a row, tolerating casing drift in upstream keys
pub fn lookup_value<'a>(row: &'a Row, column: &str) -> Option<&'a JsonValue> {
    if let Some(value) = row.get(column) {
        return Some(value);
    }

    row.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(column))
        .map(|(_, value)| value)
}

/// Render a JSON scalar as a plain string (no quotes around strings)
pub fn value_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Interpret a JSON value as a number; numeric strings are accepted
pub fn value_to_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// How a failed column fetch should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Upstream has no cached result for the query
    NoData,
    /// Any other failure
    Error,
}

/// Per-column fetch error shown next to the selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnError {
    pub kind: Severity,
    pub message: String,
}

/// Fetch result for one selected column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnData {
    pub api_id: String,
    pub api_name: String,
    pub column_name: String,
    pub data: Vec<Row>,
    pub loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ColumnError>,
}

impl ColumnData {
    /// A column that has been selected but not fetched yet
    pub fn pending(api: &ApiConfig, column_name: impl Into<String>) -> Self {
        ColumnData {
            api_id: api.id.clone(),
            api_name: api.name.clone(),
            column_name: column_name.into(),
            data: Vec::new(),
            loading: true,
            error: None,
        }
    }

    /// A fetched column
    pub fn loaded(api: &ApiConfig, column_name: impl Into<String>, data: Vec<Row>) -> Self {
        ColumnData {
            loading: false,
            data,
            ..Self::pending(api, column_name)
        }
    }

    /// A column whose fetch failed
    pub fn failed(api: &ApiConfig, column_name: impl Into<String>, error: ColumnError) -> Self {
        ColumnData {
            loading: false,
            error: Some(error),
            ..Self::pending(api, column_name)
        }
    }

    /// Key of this column in joined tables
    pub fn key(&self) -> String {
        column_key(&self.api_id, &self.column_name)
    }
}

/// Represents an error in the data module
#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::ParseError(err.to_string())
    }
}
