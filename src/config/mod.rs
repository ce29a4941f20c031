use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use config::{Config as ConfigSource, ConfigError, Environment};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::services::prompt::instruction_overhead;

pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 30_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;

/// Remote text-generation backend used for analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::OpenAi => "gpt-3.5-turbo",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::OpenAi => "https://api.openai.com",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(AppError::config(format!(
                "Unknown LLM_PROVIDER '{}', expected 'gemini' or 'openai'",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => f.write_str("gemini"),
            ProviderKind::OpenAi => f.write_str("openai"),
        }
    }
}

/// Process-wide settings, loaded once at startup and shared read-only.
#[derive(Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub request_timeout_seconds: u64,
    pub max_prompt_chars: usize,
    pub allowed_origins: Vec<String>,
    pub provider: ProviderKind,
    pub model: String,
    pub provider_base_url: String,
    pub api_key: SecretString,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub provider_max_retries: u32,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let source = ConfigSource::builder()
            .add_source(Environment::default())
            .build()
            .map_err(|e| AppError::config(format!("Failed to read environment: {}", e)))?;

        Self::from_source(&source)
    }

    /// Builds the configuration from an already assembled source. Keys are the
    /// lower-cased environment variable names (`api_key`, `max_prompt_chars`, ...).
    pub fn from_source(source: &ConfigSource) -> AppResult<Self> {
        let api_key = read_string(source, "api_key").ok_or_else(|| {
            AppError::config("API_KEY is not set; the service cannot call the LLM provider")
        })?;

        let provider = match read_string(source, "llm_provider") {
            Some(raw) => raw.parse()?,
            None => {
                info!("LLM_PROVIDER not set, using default: gemini");
                ProviderKind::Gemini
            }
        };

        let model = read_string(source, "llm_model")
            .unwrap_or_else(|| provider.default_model().to_string());
        let provider_base_url = read_string(source, "llm_base_url")
            .unwrap_or_else(|| provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        // PORT is what most hosting platforms inject, so it wins over SERVER_PORT.
        let server_port = match source.get::<u16>("port") {
            Ok(port) => port,
            Err(_) => read_or_default(source, "server_port", DEFAULT_SERVER_PORT),
        };

        let allowed_origins = read_string(source, "allowed_origins")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let config = Config {
            server_host: read_string(source, "server_host").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            server_port,
            max_file_size_mb: read_or_default(source, "max_file_size_mb", 10),
            request_timeout_seconds: read_or_default(
                source,
                "request_timeout_seconds",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            ),
            max_prompt_chars: read_or_default(source, "max_prompt_chars", DEFAULT_MAX_PROMPT_CHARS),
            allowed_origins,
            provider,
            model,
            provider_base_url,
            api_key: SecretString::from(api_key),
            temperature: read_or_default(source, "llm_temperature", DEFAULT_TEMPERATURE),
            max_output_tokens: read_or_default(
                source,
                "max_output_tokens",
                DEFAULT_MAX_OUTPUT_TOKENS,
            ),
            provider_max_retries: read_or_default(source, "provider_max_retries", 0),
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.server_port == 0 {
            return Err(AppError::config("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(AppError::config("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(AppError::config("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.max_output_tokens == 0 {
            return Err(AppError::config("MAX_OUTPUT_TOKENS must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::config("LLM_TEMPERATURE must be between 0.0 and 2.0"));
        }
        let instruction_chars = instruction_overhead();
        if self.max_prompt_chars <= instruction_chars {
            return Err(AppError::config(format!(
                "MAX_PROMPT_CHARS must exceed the instruction length ({} characters)",
                instruction_chars
            )));
        }
        if !self.provider_base_url.starts_with("http://")
            && !self.provider_base_url.starts_with("https://")
        {
            return Err(AppError::config("LLM_BASE_URL must use http or https"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn read_string(source: &ConfigSource, key: &str) -> Option<String> {
    source
        .get_string(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_or_default<T>(source: &ConfigSource, key: &str, default: T) -> T
where
    T: DeserializeOwned + fmt::Debug,
{
    match source.get::<T>(key) {
        Ok(value) => value,
        Err(ConfigError::NotFound(_)) => {
            info!("{} not set, using default: {:?}", key.to_uppercase(), default);
            default
        }
        Err(e) => {
            warn!(
                "Failed to parse {}: {} (using default: {:?})",
                key.to_uppercase(),
                e,
                default
            );
            default
        }
    }
}
