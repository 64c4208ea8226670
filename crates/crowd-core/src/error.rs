//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors raised by the model factory, tool registry, adapters and runner
#[derive(Error, Debug)]
pub enum AgentError {
    /// Provider identifier is not one of the supported providers
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// No API key was supplied and none could be resolved from configuration
    #[error("No API key configured for provider '{provider}' (set {env_var})")]
    MissingApiKey { provider: String, env_var: String },

    /// Other configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tool with the same name is already registered
    #[error("A tool with name '{0}' is already registered")]
    DuplicateTool(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Provider returned an error or an unusable response
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// Provider unreachable or failing server-side
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// Rate limited by the provider
    #[error("Rate limited by {0}")]
    RateLimited(String),

    /// Provider rejected the credentials
    #[error("Authentication failed for {0}")]
    Auth(String),

    /// Generation exceeded the caller-supplied time limit
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    /// Persisting was requested before any run completed
    #[error("No result to save")]
    NoResult,

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Raised while resolving a model; never retried
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProvider(_) | Self::MissingApiKey { .. } | Self::Config(_)
        )
    }

    /// Surfaced by an adapter call
    pub const fn is_generation(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. }
                | Self::ProviderUnavailable { .. }
                | Self::RateLimited(_)
                | Self::Auth(_)
                | Self::Timeout(_)
        )
    }

    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::RateLimited(_) | Self::Timeout(_) | Self::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedProvider(p) => format!("Unsupported provider: {p}"),
            Self::MissingApiKey { provider, .. } => {
                format!("No API key available for provider '{provider}'.")
            }
            Self::Config(msg) => format!("Configuration error: {msg}"),
            Self::DuplicateTool(name) => format!("A tool named '{name}' already exists."),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::Provider { message, .. } => {
                format!("The AI service encountered an error: {message}")
            }
            Self::ProviderUnavailable { .. } => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::RateLimited(_) => {
                "The AI service is rate limiting requests. Please wait a moment.".into()
            }
            Self::Auth(_) => "The AI service rejected the API key.".into(),
            Self::Timeout(_) => "The request took too long to process.".into(),
            Self::NoResult => "No result to save.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
