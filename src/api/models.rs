// API request and response models
// Author: Gabriel Demetrios Lafis

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::{ColumnData, ColumnError};
use crate::fetch::{Currency, FilterParams, TimeGranularity};
use crate::processing::{ChartConfiguration, DateColumnMapping, JoinedTable};

/// One column picked in the explorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSelection {
    pub api_id: String,
    pub column_name: String,
}

/// Request to join selected columns
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub selections: Vec<ColumnSelection>,
    #[serde(default)]
    pub date_column_mapping: DateColumnMapping,
    #[serde(default)]
    pub parameters: Option<JsonValue>,
}

/// Fetch state of a selected column
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStatus {
    pub key: String,
    pub api_id: String,
    pub column_name: String,
    pub loading: bool,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ColumnError>,
}

impl From<&ColumnData> for ColumnStatus {
    fn from(column: &ColumnData) -> Self {
        ColumnStatus {
            key: column.key(),
            api_id: column.api_id.clone(),
            column_name: column.column_name.clone(),
            loading: column.loading,
            rows: column.data.len(),
            error: column.error.clone(),
        }
    }
}

/// Joined table plus per-column status
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub table: JoinedTable,
    pub columns: Vec<ColumnStatus>,
}

/// Request to save a visualization built from a join
#[derive(Debug, Clone, Deserialize)]
pub struct SaveVisualizationRequest {
    pub configuration: ChartConfiguration,
    #[serde(flatten)]
    pub join: JoinRequest,
}

/// Query string of `GET /api/proxy`
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}

/// Query string of `GET /api/v1/datasets/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub currency: Option<Currency>,
    pub granularity: Option<TimeGranularity>,
}

impl DatasetQuery {
    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            currency: self.currency,
            granularity: self.granularity,
        }
    }
}
