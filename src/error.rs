//! Error types for workscribe modules using thiserror.

use thiserror::Error;

/// Errors from building the runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("AI API key is not configured. Set WORKSCRIBE_API_KEY, pass --api-key, or add api_key to .workscribe.toml")]
    MissingApiKey,

    #[error("Unsupported AI provider '{0}' (expected one of: openai, anthropic, deepseek)")]
    UnsupportedAiProvider(String),

    #[error("Unsupported VCS type '{0}' (expected one of: auto, git, svn)")]
    UnsupportedVcsType(String),

    #[error("Unsupported report language '{0}' (expected one of: zh-CN, en)")]
    UnsupportedLanguage(String),

    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Errors from version-control operations.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("{path} is not a {kind} repository")]
    NotARepository { kind: String, path: String },

    #[error("Unsupported VCS type: {0}")]
    UnsupportedType(String),

    #[error("Failed to query {backend} history: {source}")]
    QueryFailed {
        backend: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Git operation failed: {0}")]
    Git(#[source] git2::Error),

    #[error("{0} executable not found on PATH")]
    ToolNotFound(&'static str),

    #[error("Failed to spawn VCS process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("VCS command exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Failed to parse svn log XML: {0}")]
    InvalidLogXml(String),
}

impl VcsError {
    /// Wrap a retrieval failure with the backend name, as surfaced to callers.
    pub fn query_failed(
        backend: &str,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        VcsError::QueryFailed {
            backend: backend.to_string(),
            source: cause.into(),
        }
    }
}

/// Errors from AI backend calls.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI API key is not configured")]
    MissingApiKey,

    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    #[error("Request to AI backend failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{provider} API call failed ({status}): {body}")]
    Upstream {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    InvalidResponse { provider: String, message: String },
}

/// Errors from the report, commit message, and change summary workflows.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No commits found matching the query")]
    NoCommits,

    #[error("No code changes found")]
    NoChanges,

    #[error("No Git or SVN repository detected at {0}")]
    NoProviderDetected(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Ai(#[from] AiError),
}

impl ReportError {
    /// Whether this is a "nothing to do" outcome that callers present as a warning.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, ReportError::NoCommits | ReportError::NoChanges)
    }
}
