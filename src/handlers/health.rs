use axum::{extract::State, response::Json};
use tracing::debug;

use super::AppState;
use crate::models::{EndpointInfo, HealthResponse, ServiceInfo};

/// Liveness only; never touches the LLM provider.
pub async fn health_handler() -> Json<HealthResponse> {
    debug!("Health check requested");

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn root_handler(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "Medical Lab Analysis API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Upload a PDF with lab results and receive a physician-style interpretation"
            .to_string(),
        provider: state.model.name().to_string(),
        model: state.model.model().to_string(),
        endpoints: vec![
            EndpointInfo::new("GET", "/", "Service metadata"),
            EndpointInfo::new("GET", "/health", "Liveness check"),
            EndpointInfo::new("POST", "/analyze", "Analyze a lab report PDF (multipart field 'file')"),
            EndpointInfo::new("POST", "/test_gemini", "Send a short text to the language model"),
        ],
    })
}
