use serde::{Deserialize, Serialize};

use crate::llm::{model_or, post_json, MAX_TOKENS, TEMPERATURE};
use crate::{LlmError, Settings};

pub(crate) const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) async fn complete(
    http: &reqwest::Client,
    endpoint: &str,
    settings: &Settings,
    user_prompt: &str,
) -> Result<String, LlmError> {
    let request = ChatRequest {
        model: model_or(settings, DEFAULT_MODEL),
        messages: [
            ChatMessage {
                role: "system",
                content: &settings.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: user_prompt,
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    };

    let response: ChatResponse = post_json(
        http.post(endpoint).bearer_auth(&settings.api_key),
        &request,
    )
    .await?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))
}
