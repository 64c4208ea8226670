//! Model Adapter Strategy Pattern
//!
//! Defines the uniform generation contract every provider adapter implements,
//! and the closed set of providers the router can dispatch to.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crowd_core::provider::{ModelAdapter, Parameters};
//!
//! let model = factory.get_model("anthropic", "claude-3-haiku-20240307", None)?;
//! let content = model.generate("Tell me a joke", &Parameters::new()).await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Free-form generation parameters (temperature, max_tokens, ...)
pub type Parameters = HashMap<String, serde_json::Value>;

/// Supported LLM providers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Groq,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [Self; 5] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Gemini,
        Self::Groq,
        Self::OpenRouter,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Environment variable holding this provider's API key
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| AgentError::UnsupportedProvider(s.to_string()))
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = AgentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ProviderKind> for String {
    fn from(kind: ProviderKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Strategy trait for provider adapters
///
/// One implementation per provider wraps that provider's wire protocol behind
/// a single `generate` call. Adapters are shared through the model cache, so
/// they must be usable from many tasks at once.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Provider this adapter talks to
    fn provider(&self) -> ProviderKind;

    /// Provider-specific model identifier (e.g. "gpt-4o", "claude-3-haiku-20240307")
    fn model_name(&self) -> &str;

    /// Identity used in logs and results: `provider/model_name`
    fn full_name(&self) -> String {
        format!("{}/{}", self.provider(), self.model_name())
    }

    /// Generate content for a single user prompt
    async fn generate(&self, prompt: &str, parameters: &Parameters) -> Result<String>;
}

/// Merge stored parameters with per-call overrides; overrides win on collision
#[must_use]
pub fn merge_parameters(base: &Parameters, overrides: Parameters) -> Parameters {
    let mut merged = base.clone();
    merged.extend(overrides);
    merged
}
