//! Model Factory and Cache
//!
//! Resolves `(provider, model_name, api_key)` to a shared adapter instance.
//! Adapters are built through an explicit dispatch table keyed by
//! [`ProviderKind`] and memoized, so repeated lookups with the same triple
//! return the same `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::ApiKeyResolver;
use crate::error::{AgentError, Result};
use crate::provider::{ModelAdapter, ProviderKind};

/// Everything a constructor needs to build one adapter
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_name: String,
    pub api_key: String,
}

impl fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSpec")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.provider, self.model_name, redact(&self.api_key))
    }
}

/// Builds an adapter for one provider
pub type AdapterConstructor =
    Arc<dyn Fn(&ModelSpec) -> Result<Arc<dyn ModelAdapter>> + Send + Sync>;

/// Creates and caches model adapters
pub struct ModelFactory {
    constructors: HashMap<ProviderKind, AdapterConstructor>,
    keys: Arc<dyn ApiKeyResolver>,
    cache: Mutex<LruCache<ModelSpec, Arc<dyn ModelAdapter>>>,
}

impl ModelFactory {
    /// Factory with an empty dispatch table and an unbounded cache
    pub fn new(keys: Arc<dyn ApiKeyResolver>) -> Self {
        Self {
            constructors: HashMap::new(),
            keys,
            cache: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Register the constructor used for `provider`
    #[must_use]
    pub fn with_constructor<F>(mut self, provider: ProviderKind, constructor: F) -> Self
    where
        F: Fn(&ModelSpec) -> Result<Arc<dyn ModelAdapter>> + Send + Sync + 'static,
    {
        self.constructors.insert(provider, Arc::new(constructor));
        self
    }

    /// Register a prepared dispatch table; later entries replace earlier ones
    #[must_use]
    pub fn with_constructors(
        mut self,
        constructors: impl IntoIterator<Item = (ProviderKind, AdapterConstructor)>,
    ) -> Self {
        self.constructors.extend(constructors);
        self
    }

    /// Bound the cache; least recently used adapters are evicted first
    #[must_use]
    pub fn with_cache_capacity(self, capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ..self
        }
    }

    /// Providers with a registered constructor, in canonical order
    pub fn supported_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.constructors.contains_key(kind))
            .collect()
    }

    /// Get a model instance from the cache or create a new one.
    ///
    /// When `api_key` is `None` (or empty) the key is resolved from
    /// configuration for the provider.
    ///
    /// # Errors
    ///
    /// Configuration errors when the provider is unknown, has no constructor,
    /// no API key can be resolved, or the constructor rejects the spec.
    pub fn get_model(
        &self,
        provider: &str,
        model_name: &str,
        api_key: Option<&str>,
    ) -> Result<Arc<dyn ModelAdapter>> {
        let kind: ProviderKind = provider.parse()?;
        let constructor = self
            .constructors
            .get(&kind)
            .ok_or_else(|| AgentError::UnsupportedProvider(provider.to_string()))?;

        if model_name.trim().is_empty() {
            return Err(AgentError::Config("model_name must not be empty".into()));
        }

        let spec = ModelSpec {
            provider: kind,
            model_name: model_name.to_string(),
            api_key: self.resolve_api_key(kind, api_key)?,
        };

        // Held across construction so concurrent first lookups share one instance
        let mut cache = self.cache.lock();
        if let Some(model) = cache.get(&spec) {
            debug!(key = %spec, "Model cache hit");
            return Ok(Arc::clone(model));
        }

        let model = constructor(&spec)?;
        info!(key = %spec, cached = cache.len() + 1, "Created model adapter");
        cache.put(spec, Arc::clone(&model));
        Ok(model)
    }

    /// Number of cached adapters
    pub fn cached_models(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drop every cached adapter
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn resolve_api_key(&self, provider: ProviderKind, explicit: Option<&str>) -> Result<String> {
        explicit
            .filter(|key| !key.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.keys.api_key(provider))
            .ok_or_else(|| AgentError::MissingApiKey {
                provider: provider.to_string(),
                env_var: provider.env_var().to_string(),
            })
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("providers", &self.supported_providers())
            .field("cached_models", &self.cached_models())
            .finish_non_exhaustive()
    }
}

fn redact(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.chars().count() > 8 {
        format!("****{tail}")
    } else {
        "****".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticApiKeys;
    use crate::testing::{ScriptedAdapter, scripted_factory};

    #[test]
    fn test_same_triple_returns_same_instance() {
        let factory = scripted_factory();
        let a = factory.get_model("openai", "gpt-4o", Some("sk-1")).unwrap();
        let b = factory.get_model("openai", "gpt-4o", Some("sk-1")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.cached_models(), 1);
    }

    #[test]
    fn test_differing_triples_return_distinct_instances() {
        let factory = scripted_factory();
        let base = factory.get_model("openai", "gpt-4o", Some("sk-1")).unwrap();
        let other_key = factory.get_model("openai", "gpt-4o", Some("sk-2")).unwrap();
        let other_model = factory.get_model("openai", "gpt-4o-mini", Some("sk-1")).unwrap();
        let other_provider = factory.get_model("groq", "gpt-4o", Some("sk-1")).unwrap();

        assert!(!Arc::ptr_eq(&base, &other_key));
        assert!(!Arc::ptr_eq(&base, &other_model));
        assert!(!Arc::ptr_eq(&base, &other_provider));
        assert_eq!(factory.cached_models(), 4);
    }

    #[test]
    fn test_resolved_key_shares_cache_entry_with_explicit_key() {
        let factory = scripted_factory();
        let resolved = factory.get_model("openai", "gpt-4o", None).unwrap();
        let explicit = factory.get_model("openai", "gpt-4o", Some("sk-openai")).unwrap();
        assert!(Arc::ptr_eq(&resolved, &explicit));
    }

    #[test]
    fn test_provider_is_case_insensitive() {
        let factory = scripted_factory();
        let a = factory.get_model("Anthropic", "claude-3-haiku", None).unwrap();
        let b = factory.get_model("anthropic", "claude-3-haiku", None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.full_name(), "anthropic/claude-3-haiku");
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let factory = scripted_factory();
        let err = factory.get_model("mistral", "large", Some("k")).err().unwrap();
        assert!(matches!(err, AgentError::UnsupportedProvider(_)));
        assert_eq!(factory.cached_models(), 0);
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let factory = scripted_factory();
        let err = factory.get_model("openrouter", "meta/llama", None).err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));

        let err = factory.get_model("openrouter", "meta/llama", Some("  ")).err().unwrap();
        assert!(matches!(err, AgentError::MissingApiKey { .. }));
        assert_eq!(factory.cached_models(), 0);
    }

    #[test]
    fn test_provider_without_constructor_is_rejected() {
        let factory = ModelFactory::new(Arc::new(StaticApiKeys::new()))
            .with_constructor(ProviderKind::Groq, |spec| Ok(ScriptedAdapter::from_spec(spec)));

        assert_eq!(factory.supported_providers(), vec![ProviderKind::Groq]);
        let err = factory.get_model("gemini", "gemini-pro", Some("k")).err().unwrap();
        assert!(matches!(err, AgentError::UnsupportedProvider(_)));
    }

    #[test]
    fn test_empty_model_name_rejected() {
        let factory = scripted_factory();
        let err = factory.get_model("openai", " ", None).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let factory = scripted_factory().with_cache_capacity(NonZeroUsize::new(2).unwrap());

        let first = factory.get_model("openai", "a", None).unwrap();
        let _second = factory.get_model("openai", "b", None).unwrap();
        // touch "a" so "b" becomes least recently used
        let again = factory.get_model("openai", "a", None).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let _third = factory.get_model("openai", "c", None).unwrap();
        assert_eq!(factory.cached_models(), 2);

        let a = factory.get_model("openai", "a", None).unwrap();
        assert!(Arc::ptr_eq(&first, &a));
    }

    #[test]
    fn test_clear_cache() {
        let factory = scripted_factory();
        let before = factory.get_model("gemini", "gemini-pro", None).unwrap();
        factory.clear_cache();
        assert_eq!(factory.cached_models(), 0);
        let after = factory.get_model("gemini", "gemini-pro", None).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_concurrent_first_access_yields_one_instance() {
        let factory = Arc::new(scripted_factory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = Arc::clone(&factory);
                std::thread::spawn(move || factory.get_model("groq", "llama3-70b", None).unwrap())
            })
            .collect();

        let models: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(factory.cached_models(), 1);
    }

    #[test]
    fn test_spec_display_redacts_key() {
        let spec = ModelSpec {
            provider: ProviderKind::OpenAi,
            model_name: "gpt-4o".into(),
            api_key: "sk-very-secret-1234".into(),
        };
        assert_eq!(spec.to_string(), "openai/gpt-4o/****1234");
        assert!(!format!("{spec:?}").contains("secret"));
    }
}
