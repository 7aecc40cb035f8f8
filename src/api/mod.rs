// API module for exposing the explorer and dashboards via HTTP
// Author: Gabriel Demetrios Lafis

mod handlers;
mod models;
mod routes;
mod server;

pub use handlers::*;
pub use models::*;
pub use routes::*;
pub use server::*;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::data::DataError;
use crate::fetch::FetchError;
use crate::processing::ProcessingError;
use crate::storage::StorageError;

/// Represents an error in the API module
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Data error: {0}")]
    DataError(#[from] DataError),
    #[error("Processing error: {0}")]
    ProcessingError(#[from] ProcessingError),
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Upstream error: {0}")]
    Upstream(#[from] FetchError),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ProcessingError(err) => match err {
                ProcessingError::UnknownApi(_) => StatusCode::NOT_FOUND,
                ProcessingError::InvalidConfiguration(_) | ProcessingError::InvalidArgument(_) => {
                    StatusCode::BAD_REQUEST
                },
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::StorageError(err) => match err {
                StorageError::NotFound(_) => StatusCode::NOT_FOUND,
                StorageError::InvalidId(_) => StatusCode::BAD_REQUEST,
                StorageError::AlreadyExists(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Upstream(err) => match err {
                FetchError::NoCachedData(_) => StatusCode::NOT_FOUND,
                FetchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                FetchError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                FetchError::ForbiddenHost(_) => StatusCode::FORBIDDEN,
                FetchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({ "error": self.to_string() });

        if let ApiError::Upstream(err) = self {
            body["kind"] = json!(err.severity());
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
