use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{non_empty_answer, send_with_retry, AnalysisModel, GenerationSettings};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::prompt::PromptPayload;

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
    settings: GenerationSettings,
}

impl OpenAiClient {
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            endpoint: format!("{}/v1/chat/completions", config.provider_base_url),
            model: config.model.clone(),
            api_key: SecretString::from(config.api_key.expose_secret().to_owned()),
            settings: GenerationSettings::from_config(config),
        }
    }
}

#[async_trait]
impl AnalysisModel for OpenAiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &PromptPayload) -> AppResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(instruction) = prompt.instruction {
            messages.push(ChatMessage {
                role: "system",
                content: instruction,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.text,
        });

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_output_tokens,
        };

        debug!(model = %self.model, endpoint = %self.endpoint, "Sending chat completion request");

        let response = send_with_retry(PROVIDER, self.settings.max_retries, || {
            self.http
                .post(&self.endpoint)
                .bearer_auth(self.api_key.expose_secret())
                .json(&request)
        })
        .await?;

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::provider(format!("Failed to parse {} response: {}", PROVIDER, e))
        })?;

        let choice = body.choices.into_iter().next();
        if let Some(reason) = choice.as_ref().and_then(|c| c.finish_reason.as_deref()) {
            debug!(finish_reason = reason, "Chat completion finished");
        }

        non_empty_answer(PROVIDER, choice.and_then(|c| c.message.content))
    }
}
