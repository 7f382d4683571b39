//! Anthropic messages API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AiError;

use super::{MAX_OUTPUT_TOKENS, text_or_fallback};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROVIDER_NAME: &str = "Anthropic";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

/// POST `{base_url}/v1/messages` and return the first text block.
pub(crate) async fn complete(
    http: &Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, AiError> {
    let url = format!("{}/v1/messages", base_url);
    let body = MessagesRequest {
        model,
        max_tokens: MAX_OUTPUT_TOKENS,
        messages: vec![Message {
            role: "user",
            content: prompt,
        }],
    };

    let response = http
        .post(&url)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AiError::Upstream {
            provider: PROVIDER_NAME.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let parsed: MessagesResponse =
        response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse {
                provider: PROVIDER_NAME.to_string(),
                message: e.to_string(),
            })?;

    let text = first_text(parsed.content);
    debug!("Anthropic answered (empty: {})", text.is_none());

    Ok(text_or_fallback(text))
}

fn first_text(blocks: Vec<ContentBlock>) -> Option<String> {
    blocks
        .into_iter()
        .find(|b| b.kind == "text")
        .and_then(|b| b.text)
}
