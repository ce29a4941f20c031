use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("PDF decoding failed: {message}")]
    ExtractionFailure { message: String },

    #[error("PDF contains no extractable text")]
    NoExtractableText,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("LLM provider error: {message}")]
    Provider { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::ExtractionFailure { .. } => "EXTRACTION_FAILURE",
            AppError::NoExtractableText => "NO_EXTRACTABLE_TEXT",
            AppError::Configuration { .. } => "CONFIGURATION_ERROR",
            AppError::Provider { .. } => "PROVIDER_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. }
            | AppError::ExtractionFailure { .. }
            | AppError::NoExtractableText => StatusCode::BAD_REQUEST,
            AppError::Configuration { .. }
            | AppError::Provider { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text returned to the caller. Server-side causes stay in the logs.
    pub fn public_detail(&self) -> String {
        match self {
            AppError::InvalidInput { message } => message.clone(),
            AppError::ExtractionFailure { .. } => {
                "The uploaded file could not be read as a PDF document".to_string()
            }
            AppError::NoExtractableText => {
                "No text could be extracted from the PDF; scanned or image-only documents are not supported"
                    .to_string()
            }
            AppError::Configuration { .. } => "Service is not configured correctly".to_string(),
            AppError::Provider { .. } => {
                "Failed to obtain an analysis from the language model".to_string()
            }
            AppError::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                error_message = %self,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = Json(json!({ "detail": self.public_detail() }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: format!("{:#}", err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal {
            message: format!("Background task failed: {}", err),
        }
    }
}

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::ExtractionFailure {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connection failure"
        } else if err.is_decode() {
            "malformed response"
        } else {
            "transport failure"
        };
        AppError::Provider {
            message: format!("{}: {}", kind, err),
        }
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::ExtractionFailure {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::Configuration {
            message: message.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        AppError::Provider {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
