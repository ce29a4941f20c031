use axum::response::{IntoResponse, Response};
use std::any::Any;

use crate::error::AppError;

/// Converts a handler panic into the generic 500 body; the payload is only logged.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(format!("handler panicked: {}", detail)).into_response()
}
