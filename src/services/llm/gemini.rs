use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{non_empty_answer, send_with_retry, AnalysisModel, GenerationSettings};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::prompt::PromptPayload;

const PROVIDER: &str = "gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Google Generative Language `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
    settings: GenerationSettings,
}

impl GeminiClient {
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        let model = config.model.trim_start_matches("models/").to_string();
        Self {
            http,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.provider_base_url, model
            ),
            model,
            api_key: SecretString::from(config.api_key.expose_secret().to_owned()),
            settings: GenerationSettings::from_config(config),
        }
    }
}

#[async_trait]
impl AnalysisModel for GeminiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &PromptPayload) -> AppResult<String> {
        let rendered = prompt.render();
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &rendered }],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_output_tokens,
            },
        };

        debug!(model = %self.model, "Sending generateContent request");

        let response = send_with_retry(PROVIDER, self.settings.max_retries, || {
            self.http
                .post(&self.endpoint)
                .header("x-goog-api-key", self.api_key.expose_secret())
                .json(&request)
        })
        .await?;

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::provider(format!("Failed to parse {} response: {}", PROVIDER, e))
        })?;

        if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
            warn!(block_reason = %reason, "Prompt was blocked by the provider");
            return Err(AppError::provider(format!("prompt blocked: {}", reason)));
        }

        let candidate = body.candidates.into_iter().next();
        if let Some(reason) = candidate.as_ref().and_then(|c| c.finish_reason.as_deref()) {
            debug!(finish_reason = reason, "Generation finished");
        }

        let text = candidate.and_then(|c| c.content).map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        });

        non_empty_answer(PROVIDER, text)
    }
}
