// TopLedger Explorer
// Author: Gabriel Demetrios Lafis

//! # TopLedger Explorer
//!
//! Fetches TopLedger analytics query results, caches them, joins result
//! sets from different queries by date, and turns chart builder settings
//! into renderer-ready chart specs.
//!
//! ## Features
//!
//! - API catalog loaded from the `api-cache.json` snapshot
//! - Upstream client with timeouts, retries and a response cache
//! - Date-column detection and multi-API joins on normalized dates
//! - Chart configuration translation, legends and brush filtering
//! - Saved visualizations in memory or on disk
//! - REST API and proxy route for remote access
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use topledger_explorer::{
//!     data::{ApiCatalog, ApiConfig, ColumnData, HttpMethod, Row},
//!     processing::{generate_joined_table, DateColumnMapping},
//! };
//!
//! fn rows(value: serde_json::Value) -> Vec<Row> {
//!     serde_json::from_value(value).unwrap()
//! }
//!
//! let api = |id: &str| ApiConfig {
//!     id: id.to_string(),
//!     name: id.to_uppercase(),
//!     endpoint: format!("https://analytics.topledger.xyz/tl/api/queries/{}/results", id),
//!     method: HttpMethod::Get,
//!     columns: vec!["block_date".to_string(), "value".to_string()],
//!     chart_title: None,
//!     api_key: None,
//!     additional_options: None,
//!     page: None,
//! };
//! let (a, b) = (api("a"), api("b"));
//! let catalog = ApiCatalog::from_configs(vec![a.clone(), b.clone()]);
//!
//! let data_a = rows(json!([{ "block_date": "2024-01-01", "value": 1 }]));
//! let data_b = rows(json!([{ "block_date": "2024-01-01T00:00:00Z", "value": 2 }]));
//!
//! let columns = vec![
//!     ColumnData::loaded(&a, "block_date", data_a.clone()),
//!     ColumnData::loaded(&a, "value", data_a),
//!     ColumnData::loaded(&b, "block_date", data_b.clone()),
//!     ColumnData::loaded(&b, "value", data_b),
//! ];
//!
//! let table = generate_joined_table(&columns, &catalog, &DateColumnMapping::new());
//! assert_eq!(table.rows.len(), 1);
//! assert_eq!(table.rows[0].values["a_value"], json!(1));
//! assert_eq!(table.rows[0].values["b_value"], json!(2));
//! ```

pub mod api;
pub mod data;
pub mod fetch;
pub mod processing;
pub mod storage;
pub mod utils;

// Re-export main types
pub use api::Server;
pub use data::{ApiCatalog, ApiConfig, ColumnData, Row};
pub use fetch::{RowFetcher, TopLedgerClient};
pub use processing::{ExplorerSession, JoinedTable};
pub use utils::Config;
