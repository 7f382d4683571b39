//! OpenAI-compatible chat completions, shared by OpenAI and DeepSeek.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AiError;

use super::{AiProvider, MAX_OUTPUT_TOKENS, TEMPERATURE, text_or_fallback};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// POST `{base_url}/chat/completions` with bearer auth.
pub(crate) async fn complete(
    http: &Client,
    provider: AiProvider,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, AiError> {
    let url = format!("{}/chat/completions", base_url);
    let body = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
    };

    let response = http
        .post(&url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AiError::Upstream {
            provider: provider.display_name().to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| AiError::InvalidResponse {
            provider: provider.display_name().to_string(),
            message: e.to_string(),
        })?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content);
    debug!("{} answered (empty: {})", provider, text.is_none());

    Ok(text_or_fallback(text))
}
