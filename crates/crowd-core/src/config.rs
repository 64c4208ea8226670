//! API key resolution
//!
//! When a caller does not pass an API key explicitly, the model factory asks an
//! [`ApiKeyResolver`] for one, keyed by provider.

use std::collections::HashMap;

use crate::provider::ProviderKind;

/// Supplies provider API keys from configuration
pub trait ApiKeyResolver: Send + Sync {
    /// API key for `provider`, if one is configured
    fn api_key(&self, provider: ProviderKind) -> Option<String>;
}

/// Reads keys from the provider environment variables (`OPENAI_API_KEY`, ...)
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvApiKeys;

impl ApiKeyResolver for EnvApiKeys {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        std::env::var(provider.env_var())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Fixed key table
#[derive(Clone, Default)]
pub struct StaticApiKeys {
    keys: HashMap<ProviderKind, String>,
}

impl StaticApiKeys {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key(mut self, provider: ProviderKind, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }
}

impl std::fmt::Debug for StaticApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticApiKeys")
            .field("providers", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ApiKeyResolver for StaticApiKeys {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        self.keys.get(&provider).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_keys() {
        let keys = StaticApiKeys::new().with_key(ProviderKind::Groq, "gsk_test");
        assert_eq!(keys.api_key(ProviderKind::Groq).as_deref(), Some("gsk_test"));
        assert!(keys.api_key(ProviderKind::OpenAi).is_none());
    }

    #[test]
    fn test_static_keys_debug_hides_values() {
        let keys = StaticApiKeys::new().with_key(ProviderKind::Anthropic, "sk-ant-secret");
        let debug = format!("{keys:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("Anthropic"));
    }
}
