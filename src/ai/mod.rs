//! AI backends behind a single `complete(prompt) -> text` capability.
//!
//! Two wire shapes are supported: OpenAI-compatible chat completions (used by
//! OpenAI and DeepSeek, differing only in endpoint) and the Anthropic
//! messages API. Prompt construction never branches on the backend.

pub mod anthropic;
pub mod openai;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::Settings;
use crate::error::AiError;

/// Returned when a backend answers successfully but without usable text.
pub const EMPTY_COMPLETION_FALLBACK: &str = "Generation failed: the AI backend returned no content.";

/// Sampling temperature for chat-completion backends.
pub const TEMPERATURE: f32 = 0.7;

/// Output token budget for every backend.
pub const MAX_OUTPUT_TOKENS: u32 = 2000;

/// Supported AI vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Anthropic,
    DeepSeek,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
            AiProvider::DeepSeek => "deepseek",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "OpenAI",
            AiProvider::Anthropic => "Anthropic",
            AiProvider::DeepSeek => "DeepSeek",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::Anthropic => "claude-3-haiku-20240307",
            AiProvider::DeepSeek => "deepseek-chat",
        }
    }

    /// Public service base URL.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => openai::OPENAI_BASE_URL,
            AiProvider::Anthropic => anthropic::ANTHROPIC_BASE_URL,
            AiProvider::DeepSeek => openai::DEEPSEEK_BASE_URL,
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for AiProvider {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "anthropic" => Ok(AiProvider::Anthropic),
            "deepseek" => Ok(AiProvider::DeepSeek),
            _ => Err(AiError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Anything that can turn a prompt into generated text.
///
/// This abstraction allows substituting the network client in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

/// HTTP client for one configured backend.
#[derive(Debug, Clone)]
pub struct AiClient {
    provider: AiProvider,
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl AiClient {
    /// Client for `provider`; `model` falls back to the provider default.
    pub fn new(provider: AiProvider, api_key: impl Into<String>, model: Option<String>) -> Self {
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());
        Self {
            provider,
            api_key: api_key.into(),
            model,
            base_url: provider.default_base_url().to_string(),
            http: Client::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.ai_provider,
            settings.api_key.clone(),
            settings.model.clone(),
        )
    }

    /// Point the client at a different service root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> AiProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Completer for AiClient {
    /// Send `prompt` as a single user message.
    ///
    /// A blank API key fails before any request is made.
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        if self.api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }

        debug!(
            "Calling {} model {} with a {}-char prompt",
            self.provider,
            self.model,
            prompt.chars().count()
        );

        match self.provider {
            AiProvider::OpenAi | AiProvider::DeepSeek => {
                openai::complete(
                    &self.http,
                    self.provider,
                    &self.base_url,
                    &self.api_key,
                    &self.model,
                    prompt,
                )
                .await
            }
            AiProvider::Anthropic => {
                anthropic::complete(&self.http, &self.base_url, &self.api_key, &self.model, prompt)
                    .await
            }
        }
    }
}

/// One-shot completion by provider identifier.
///
/// Unknown identifiers and blank keys fail before any network call.
pub async fn complete(
    provider: &str,
    api_key: &str,
    model: Option<&str>,
    prompt: &str,
) -> Result<String, AiError> {
    let provider: AiProvider = provider.parse()?;
    AiClient::new(provider, api_key, model.map(str::to_string))
        .complete(prompt)
        .await
}

/// Use the backend's text, or the fallback string when there is none.
pub(crate) fn text_or_fallback(text: Option<String>) -> String {
    match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => EMPTY_COMPLETION_FALLBACK.to_string(),
    }
}
