use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::batch::BatchReport;
use crate::services::storage::StoreError;
use crate::utils::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed request: {message}")]
    MalformedRequest { status: StatusCode, message: String },

    #[error("Batch aborted at {failed_item} after {completed} item(s): {source}")]
    Batch {
        completed: usize,
        failed_item: String,
        source: StoreError,
    },

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::MalformedRequest {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Turns a failed batch into an error; a clean batch yields its item count.
    pub fn check_batch(report: BatchReport) -> Result<usize, AppError> {
        match report.failure {
            None => Ok(report.completed),
            Some(failure) => Err(AppError::Batch {
                completed: report.completed,
                failed_item: failure.item,
                source: failure.error,
            }),
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Auth(_) => StatusCode::BAD_GATEWAY,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Write { .. } | StoreError::Delete { .. } => StatusCode::BAD_GATEWAY,
        StoreError::Cancelled => StatusCode::REQUEST_TIMEOUT,
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::MalformedRequest {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::MalformedRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MalformedRequest { status, message } => {
                tracing::warn!("Rejected malformed request: {}", message);
                (status, Json(json!({ "error": message }))).into_response()
            }
            AppError::Batch {
                completed,
                failed_item,
                source,
            } => {
                tracing::error!(
                    "Batch aborted at {} after {} item(s): {}",
                    failed_item,
                    completed,
                    source
                );
                let body = Json(json!({
                    "error": source.to_string(),
                    "completed": completed,
                    "failed_item": failed_item,
                }));
                (store_status(&source), body).into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
