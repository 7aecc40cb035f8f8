// Processing module for joining, filtering and charting query results
// Author: Gabriel Demetrios Lafis

mod chart;
mod explorer;
mod join;
mod series;

pub use chart::*;
pub use explorer::*;
pub use join::*;
pub use series::*;

use thiserror::Error;

use crate::data::DataError;

/// Represents an error in the processing module
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Data error: {0}")]
    DataError(#[from] DataError),
    #[error("Unknown API: {0}")]
    UnknownApi(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
