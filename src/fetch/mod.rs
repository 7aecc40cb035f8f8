// Fetch module for talking to the analytics API
// Author: Gabriel Demetrios Lafis

mod cache;
mod client;
mod dataset;
mod fallback;
mod proxy;
mod retry;

pub use cache::*;
pub use client::*;
pub use dataset::*;
pub use fallback::*;
pub use proxy::*;
pub use retry::*;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::data::{ColumnError, DataError, HttpMethod, Row, Severity};

/// Which envelopes a request accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapePolicy {
    /// Only `query_result.data.rows`
    Canonical,
    /// Any known nesting, first match wins
    Probe,
}

/// A single query against the analytics API
#[derive(Debug, Clone, PartialEq)]
pub struct RowRequest {
    pub url: String,
    pub method: HttpMethod,
    pub parameters: Option<JsonValue>,
    pub shape: ShapePolicy,
}

impl RowRequest {
    /// Build a request; queries with parameters are always POSTed
    pub fn new(url: impl Into<String>, method: HttpMethod, parameters: Option<JsonValue>, shape: ShapePolicy) -> Self {
        let method = if parameters.is_some() { HttpMethod::Post } else { method };

        RowRequest {
            url: url.into(),
            method,
            parameters,
            shape,
        }
    }

    /// JSON body sent with POST requests
    pub fn body(&self) -> JsonValue {
        json!({
            "parameters": self.parameters.clone().unwrap_or_else(|| json!({})),
        })
    }
}

/// Anything that can turn a request into rows
#[async_trait]
pub trait RowFetcher: Send + Sync {
    async fn fetch_rows(&self, request: &RowRequest) -> Result<Vec<Row>, FetchError>;
}

#[async_trait]
impl<T: RowFetcher + ?Sized> RowFetcher for Arc<T> {
    async fn fetch_rows(&self, request: &RowRequest) -> Result<Vec<Row>, FetchError> {
        (**self).fetch_rows(request).await
    }
}

/// Represents an error while fetching rows
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request aborted: {0}")]
    Aborted(String),
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("No cached data: {0}")]
    NoCachedData(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Host not allowed: {0}")]
    ForbiddenHost(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Timeouts, aborted requests and failed connections are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Aborted(_) | FetchError::Connect(_))
    }

    /// The error reported once retries of a retryable error run out
    pub fn exhausted(self, attempts: u32) -> FetchError {
        match self {
            FetchError::Connect(message) => FetchError::Network(message),
            _ => FetchError::Timeout { attempts },
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FetchError::NoCachedData(_) => Severity::NoData,
            _ => Severity::Error,
        }
    }

    /// Badge shown next to a selected column
    pub fn to_column_error(&self) -> ColumnError {
        ColumnError {
            kind: self.severity(),
            message: self.to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Aborted(err.to_string())
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<DataError> for FetchError {
    fn from(err: DataError) -> Self {
        FetchError::MalformedResponse(err.to_string())
    }
}

/// Currency a dashboard query reports values in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Sol,
}

/// Bucket size of a time-series query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGranularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Optional dashboard filters forwarded as query parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub granularity: Option<TimeGranularity>,
}

impl FilterParams {
    /// The `parameters` object for the upstream query, if any filter is set
    pub fn to_parameters(&self) -> Option<JsonValue> {
        let mut params = serde_json::Map::new();

        if let Some(currency) = self.currency {
            params.insert("currency".to_string(), serde_json::to_value(currency).ok()?);
        }
        if let Some(granularity) = self.granularity {
            params.insert("date_part".to_string(), serde_json::to_value(granularity).ok()?);
        }

        if params.is_empty() {
            None
        } else {
            Some(JsonValue::Object(params))
        }
    }
}
