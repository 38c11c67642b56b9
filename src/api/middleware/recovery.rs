use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::api::error::AppError;

/// Converts a handler panic into a 500 so the process keeps serving.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!("💥 Handler panicked: {}", detail);
    AppError::Internal(detail).into_response()
}
