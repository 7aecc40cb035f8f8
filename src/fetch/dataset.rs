// Remote time-series datasets backing dashboard charts
// Author: Gabriel Demetrios Lafis

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, NaiveDate, Utc};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{HttpMethod, Row, Severity};
use crate::processing::Series;
use super::{generate_placeholder_rows, generate_sol_burn, FallbackPolicy, FetchError, FilterParams, RowFetcher, RowRequest, ShapePolicy};

const PLACEHOLDER_DAYS: i64 = 90;

/// Configuration of one dashboard dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDefinition {
    pub id: String,
    pub title: String,
    pub query_id: String,
    #[serde(default)]
    pub method: HttpMethod,
    pub date_column: String,
    pub value_columns: Vec<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl DatasetDefinition {
    /// Whether the dataset has the SOL burn layout
    pub fn is_sol_burn(&self) -> bool {
        self.date_column == "block_date"
            && !self.value_columns.is_empty()
            && self
                .value_columns
                .iter()
                .all(|column| column == "sol_burn" || column == "cumulative_sol_burn")
    }

    /// Generated rows in this dataset's layout, one per day
    pub fn placeholder_rows<R: Rng + ?Sized>(&self, start: NaiveDate, end: NaiveDate, rng: &mut R) -> Vec<Row> {
        if self.is_sol_burn() {
            generate_sol_burn(start, end, rng).iter().map(|point| point.to_row()).collect()
        } else {
            generate_placeholder_rows(start, end, &self.date_column, &self.value_columns, rng)
        }
    }
}

/// Outcome of loading a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SeriesState {
    /// Data from the live query
    Live { series: Series },
    /// Generated data standing in for a failed query
    Placeholder { series: Series, reason: String },
    /// The query failed and no placeholder is configured
    Unavailable { reason: String, severity: Severity },
    /// A newer load started before this one finished
    Superseded,
}

impl SeriesState {
    pub fn series(&self) -> Option<&Series> {
        match self {
            SeriesState::Live { series } | SeriesState::Placeholder { series, .. } => Some(series),
            _ => None,
        }
    }
}

/// A dataset loaded on demand from the analytics API
pub struct RemoteDataset<F> {
    definition: DatasetDefinition,
    fetcher: F,
    url: String,
    fallback: FallbackPolicy,
    generation: AtomicU64,
}

impl<F: RowFetcher> RemoteDataset<F> {
    /// Create a dataset reading from `url`
    pub fn new(definition: DatasetDefinition, fetcher: F, url: impl Into<String>, fallback: FallbackPolicy) -> Self {
        RemoteDataset {
            definition,
            fetcher,
            url: url.into(),
            fallback,
            generation: AtomicU64::new(0),
        }
    }

    pub fn definition(&self) -> &DatasetDefinition {
        &self.definition
    }

    /// Load the dataset with the given filters. Only the most recently
    /// started load reports data; earlier ones come back `Superseded`.
    pub async fn load(&self, params: &FilterParams) -> SeriesState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let request = RowRequest::new(
            self.url.clone(),
            self.definition.method,
            params.to_parameters(),
            ShapePolicy::Canonical,
        );
        let result = self.fetcher.fetch_rows(&request).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            info!("Dropping stale result for dataset '{}'", self.definition.id);
            return SeriesState::Superseded;
        }

        match result {
            Ok(rows) => SeriesState::Live {
                series: Series::from_rows(&rows, &self.definition.date_column, &self.definition.value_columns),
            },
            Err(err) => self.on_failure(err),
        }
    }

    fn on_failure(&self, err: FetchError) -> SeriesState {
        warn!("Dataset '{}' failed to load: {}", self.definition.id, err);

        match self.fallback {
            FallbackPolicy::Disabled => SeriesState::Unavailable {
                reason: err.to_string(),
                severity: err.severity(),
            },
            FallbackPolicy::Placeholder => {
                let end = Utc::now().date_naive();
                let start = end - Duration::days(PLACEHOLDER_DAYS - 1);
                let rows = self.definition.placeholder_rows(start, end, &mut rand::thread_rng());

                SeriesState::Placeholder {
                    series: Series::from_rows(&rows, &self.definition.date_column, &self.definition.value_columns),
                    reason: err.to_string(),
                }
            },
        }
    }
}
