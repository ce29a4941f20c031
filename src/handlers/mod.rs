pub mod analyze;
pub mod diagnostics;
pub mod health;

pub use analyze::*;
pub use diagnostics::*;
pub use health::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{cors_layer, logging_middleware, panic_response};
use crate::services::AnalysisModel;

/// Immutable per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub model: Arc<dyn AnalysisModel>,
}

impl AppState {
    pub fn new(config: Config, model: Arc<dyn AnalysisModel>) -> Self {
        Self {
            config: Arc::new(config),
            model,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes();
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .route("/test_gemini", post(test_provider_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(logging_middleware))
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}
