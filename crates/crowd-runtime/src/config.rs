//! Endpoint and client configuration

use std::num::NonZeroUsize;
use std::time::Duration;

use crowd_core::ProviderKind;

/// Base URL per provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub openai: String,
    pub anthropic: String,
    pub gemini: String,
    pub groq: String,
    pub openrouter: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            openai: "https://api.openai.com/v1".into(),
            anthropic: "https://api.anthropic.com".into(),
            gemini: "https://generativelanguage.googleapis.com".into(),
            groq: "https://api.groq.com/openai/v1".into(),
            openrouter: "https://openrouter.ai/api/v1".into(),
        }
    }
}

impl ProviderEndpoints {
    /// Defaults, overridden by `<PROVIDER>_BASE_URL` variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Point every provider at one base URL
    pub fn uniform(base_url: impl Into<String>) -> Self {
        let base = trim_base(base_url.into());
        Self {
            openai: base.clone(),
            anthropic: base.clone(),
            gemini: base.clone(),
            groq: base.clone(),
            openrouter: base,
        }
    }

    pub fn base_url(&self, provider: ProviderKind) -> &str {
        match provider {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Groq => &self.groq,
            ProviderKind::OpenRouter => &self.openrouter,
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let pick = |var: &str, default: String| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .map_or(default, trim_base)
        };

        Self {
            openai: pick("OPENAI_BASE_URL", defaults.openai),
            anthropic: pick("ANTHROPIC_BASE_URL", defaults.anthropic),
            gemini: pick("GEMINI_BASE_URL", defaults.gemini),
            groq: pick("GROQ_BASE_URL", defaults.groq),
            openrouter: pick("OPENROUTER_BASE_URL", defaults.openrouter),
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Runtime configuration for the default factory
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Provider base URLs
    pub endpoints: ProviderEndpoints,

    /// Per-request timeout of the shared HTTP client
    pub request_timeout: Duration,

    /// Model cache bound; unbounded when `None`
    pub cache_capacity: Option<NonZeroUsize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoints: ProviderEndpoints::default(),
            request_timeout: Duration::from_secs(120),
            cache_capacity: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let request_timeout = lookup("LLM_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .map_or(Duration::from_secs(120), Duration::from_secs);
        let cache_capacity = lookup("MODEL_CACHE_CAPACITY")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .and_then(NonZeroUsize::new);

        Self {
            endpoints: ProviderEndpoints::from_lookup(&lookup),
            request_timeout,
            cache_capacity,
        }
    }
}
