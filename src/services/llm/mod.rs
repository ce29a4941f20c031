//! Outbound text-generation clients.
//!
//! Handlers only see [`AnalysisModel`]; the concrete provider is chosen once at
//! startup by [`build_model`] and shared read-only behind an `Arc`.

mod gemini;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::config::{Config, ProviderKind};
use crate::error::{AppError, AppResult};
use crate::services::prompt::PromptPayload;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 5000;
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Remote model able to turn a prompt into free-form text.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Returns the generated text. Blank answers are reported as errors.
    async fn generate(&self, prompt: &PromptPayload) -> AppResult<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_retries: u32,
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            max_retries: config.provider_max_retries,
        }
    }
}

pub fn build_model(config: &Config) -> AppResult<Arc<dyn AnalysisModel>> {
    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout()))
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

    let model: Arc<dyn AnalysisModel> = match config.provider {
        ProviderKind::Gemini => Arc::new(GeminiClient::from_config(http, config)),
        ProviderKind::OpenAi => Arc::new(OpenAiClient::from_config(http, config)),
    };

    tracing::info!(
        provider = model.name(),
        model = model.model(),
        timeout_secs = config.request_timeout_seconds,
        max_retries = config.provider_max_retries,
        "LLM client initialized"
    );

    Ok(model)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

/// Capped exponential backoff with up to 100ms of jitter.
fn calculate_backoff(attempt: u32) -> Duration {
    let base_delay = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt));
    let capped_delay = base_delay.min(MAX_BACKOFF_MS);
    let jitter = u64::from(chrono::Utc::now().timestamp_subsec_millis()) % 100;
    Duration::from_millis(capped_delay + jitter)
}

/// Sends a request, retrying transport failures and 429/5xx answers at most
/// `max_retries` times. Any other non-success status is returned as an error
/// straight away.
async fn send_with_retry<F>(
    provider: &'static str,
    max_retries: u32,
    build_request: F,
) -> AppResult<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let backoff = calculate_backoff(attempt - 1);
            warn!(
                provider = provider,
                attempt = attempt,
                "LLM request failed, retrying in {:?}",
                backoff
            );
            tokio::time::sleep(backoff).await;
        }

        match build_request().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) && attempt < max_retries {
                    attempt += 1;
                    continue;
                }
                let body = response.text().await.unwrap_or_default();
                let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
                return Err(AppError::provider(format!(
                    "{} returned {}: {}",
                    provider, status, body
                )));
            }
            Err(e) => {
                if is_retryable_error(&e) && attempt < max_retries {
                    attempt += 1;
                    continue;
                }
                return Err(AppError::from(e));
            }
        }
    }
}

fn non_empty_answer(provider: &'static str, text: Option<String>) -> AppResult<String> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AppError::provider(format!("{} returned an empty response", provider))),
    }
}
