use serde::{Deserialize, Serialize};

use crate::llm::{model_or, post_json, MAX_TOKENS, TEMPERATURE};
use crate::{LlmError, Settings};

pub(crate) const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub(crate) async fn complete(
    http: &reqwest::Client,
    endpoint: &str,
    settings: &Settings,
    user_prompt: &str,
) -> Result<String, LlmError> {
    let request = MessagesRequest {
        model: model_or(settings, DEFAULT_MODEL),
        system: &settings.system_prompt,
        messages: [UserMessage {
            role: "user",
            content: user_prompt,
        }],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    };

    let response: MessagesResponse = post_json(
        http.post(endpoint)
            .header("x-api-key", &settings.api_key)
            .header("anthropic-version", API_VERSION),
        &request,
    )
    .await?;

    response
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| LlmError::MalformedResponse("no content blocks in response".to_string()))
}
