// Storage module for saved visualizations
// Author: Gabriel Demetrios Lafis

mod file;
mod memory;

pub use file::*;
pub use memory::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::processing::{materialize_chart_data, translate, ChartConfig, ChartConfiguration, ChartData, JoinedTable, ProcessingError};

/// A saved chart: configuration plus the data it showed when saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedVisualization {
    pub id: String,
    pub name: String,
    pub configuration: ChartConfiguration,
    pub chart_config: ChartConfig,
    pub chart_data: ChartData,
    pub created_at: DateTime<Utc>,
}

impl SavedVisualization {
    /// Validate and translate a configuration, materialize its data from
    /// the joined table, and stamp it with a fresh id
    pub fn snapshot(configuration: ChartConfiguration, table: &JoinedTable) -> Result<Self, ProcessingError> {
        let chart_config = translate(&configuration)?;
        let chart_data = materialize_chart_data(table, &chart_config);

        Ok(SavedVisualization {
            id: Uuid::new_v4().to_string(),
            name: configuration.name.clone(),
            configuration,
            chart_config,
            chart_data,
            created_at: Utc::now(),
        })
    }
}

/// Represents a store of saved visualizations
pub trait VisualizationStore {
    /// Store a visualization under its id. Saved visualizations are
    /// immutable, so an id that is already taken is `AlreadyExists`.
    fn store(&self, visualization: &SavedVisualization) -> Result<(), StorageError>;

    /// Load a visualization
    fn load(&self, id: &str) -> Result<SavedVisualization, StorageError>;

    /// Check if a visualization exists
    fn exists(&self, id: &str) -> Result<bool, StorageError>;

    /// Delete a visualization
    fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// List all visualizations, oldest first
    fn list(&self) -> Result<Vec<SavedVisualization>, StorageError>;
}

/// Represents an error in the storage module
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Visualization '{0}' not found")]
    NotFound(String),
    #[error("Visualization '{0}' already exists")]
    AlreadyExists(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Error: {0}")]
    Other(String),
}

/// Ids become file names, so only UUID-like characters are accepted
pub fn validate_id(id: &str) -> Result<(), StorageError> {
    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}
