use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unbait_logging::unbait_debug;

use crate::{anthropic, openai, ExtractedContent, Provider, Settings};

/// Sampling temperature sent to every provider.
pub(crate) const TEMPERATURE: f64 = 0.3;
/// Answers are one sentence; keep the budget tight.
pub(crate) const MAX_TOKENS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("API key not configured. Please add it in the settings.")]
    MissingApiKey,
    #[error("Failed to extract content from the page properly")]
    EmptyContent,
    #[error("{}", .message.as_deref().unwrap_or("Unknown error"))]
    Provider { status: u16, message: Option<String> },
    #[error("{0}")]
    Network(String),
    #[error("could not encode request: {0}")]
    Encode(String),
    #[error("unexpected response from provider: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Text shown in the error popup.
    pub fn user_message(&self) -> String {
        format!("API request failed: {self}")
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn answer(
        &self,
        content: &ExtractedContent,
        settings: &Settings,
    ) -> Result<String, LlmError>;
}

/// Provider endpoints; overridable so tests can point at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmEndpoints {
    pub openai: String,
    pub anthropic: String,
}

impl Default for LlmEndpoints {
    fn default() -> Self {
        Self {
            openai: "https://api.openai.com/v1/chat/completions".to_string(),
            anthropic: "https://api.anthropic.com/v1/messages".to_string(),
        }
    }
}

/// Dispatches to the vendor selected in [`Settings::provider`].
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    endpoints: LlmEndpoints,
}

impl ProviderClient {
    pub fn new(endpoints: LlmEndpoints) -> Result<Self, LlmError> {
        // No overall timeout: the provider round trip is bounded only by the transport.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| LlmError::Network(err.to_string()))?;
        Ok(Self { http, endpoints })
    }
}

#[async_trait]
impl LlmClient for ProviderClient {
    async fn answer(
        &self,
        content: &ExtractedContent,
        settings: &Settings,
    ) -> Result<String, LlmError> {
        if settings.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        if !content.is_usable() {
            return Err(LlmError::EmptyContent);
        }

        let prompt = format_user_prompt(content);
        unbait_debug!(
            "Querying {} ({} prompt chars) for {}",
            settings.provider,
            prompt.len(),
            content.url
        );
        match settings.provider {
            Provider::OpenAi => {
                openai::complete(&self.http, &self.endpoints.openai, settings, &prompt).await
            }
            Provider::Anthropic => {
                anthropic::complete(&self.http, &self.endpoints.anthropic, settings, &prompt)
                    .await
            }
        }
    }
}

pub fn format_user_prompt(content: &ExtractedContent) -> String {
    format!("Title: {}\n\nContent: {}", content.title, content.content)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// POST `body` as JSON and decode a success response, or the vendor's `error.message`.
pub(crate) async fn post_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    body: &impl Serialize,
) -> Result<T, LlmError> {
    let payload = serde_json::to_vec(body).map_err(|err| LlmError::Encode(err.to_string()))?;
    let response = request
        .header(CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await
        .map_err(|err| LlmError::Network(err.to_string()))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| LlmError::Network(err.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorEnvelope>(&bytes)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.message);
        return Err(LlmError::Provider {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&bytes).map_err(|err| LlmError::MalformedResponse(err.to_string()))
}

/// Empty model strings fall back to the vendor default.
pub(crate) fn model_or<'a>(settings: &'a Settings, default: &'a str) -> &'a str {
    let model = settings.model.trim();
    if model.is_empty() {
        default
    } else {
        model
    }
}
