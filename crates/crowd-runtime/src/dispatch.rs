//! Default dispatch table and process-wide factory

use std::collections::HashMap;
use std::sync::Arc;

use crowd_core::{
    AdapterConstructor, EnvApiKeys, ModelAdapter, ModelFactory, ModelSpec, ProviderKind, Result,
};
use once_cell::sync::OnceCell;
use reqwest::Client;
use tracing::info;

use crate::anthropic::AnthropicAdapter;
use crate::config::{ProviderEndpoints, RuntimeConfig};
use crate::gemini::GeminiAdapter;
use crate::http::build_client;
use crate::openai::OpenAiCompatAdapter;

static GLOBAL_FACTORY: OnceCell<Arc<ModelFactory>> = OnceCell::new();

fn constructor<A, F>(build: F) -> AdapterConstructor
where
    A: ModelAdapter + 'static,
    F: Fn(&ModelSpec) -> A + Send + Sync + 'static,
{
    Arc::new(move |spec: &ModelSpec| -> Result<Arc<dyn ModelAdapter>> { Ok(Arc::new(build(spec))) })
}

/// One constructor per provider, all sharing `client`
pub fn default_constructors(
    client: &Client,
    endpoints: &ProviderEndpoints,
) -> HashMap<ProviderKind, AdapterConstructor> {
    let mut table = HashMap::new();

    for kind in [ProviderKind::OpenAi, ProviderKind::Groq, ProviderKind::OpenRouter] {
        let client = client.clone();
        let base_url = endpoints.base_url(kind).to_string();
        table.insert(
            kind,
            constructor(move |spec| {
                OpenAiCompatAdapter::new(
                    client.clone(),
                    spec.provider,
                    &spec.api_key,
                    &base_url,
                    &spec.model_name,
                )
            }),
        );
    }

    let (client_a, base_a) = (client.clone(), endpoints.anthropic.clone());
    table.insert(
        ProviderKind::Anthropic,
        constructor(move |spec| {
            AnthropicAdapter::new(client_a.clone(), &spec.api_key, &base_a, &spec.model_name)
        }),
    );

    let (client_g, base_g) = (client.clone(), endpoints.gemini.clone());
    table.insert(
        ProviderKind::Gemini,
        constructor(move |spec| {
            GeminiAdapter::new(client_g.clone(), &spec.api_key, &base_g, &spec.model_name)
        }),
    );

    table
}

/// Factory with every provider registered and keys read from the environment
pub fn default_factory(config: &RuntimeConfig) -> Result<ModelFactory> {
    let client = build_client(config.request_timeout)?;
    let mut factory = ModelFactory::new(Arc::new(EnvApiKeys))
        .with_constructors(default_constructors(&client, &config.endpoints));

    if let Some(capacity) = config.cache_capacity {
        factory = factory.with_cache_capacity(capacity);
    }

    info!(
        timeout = ?config.request_timeout,
        cache_capacity = ?config.cache_capacity,
        "Model factory ready"
    );
    Ok(factory)
}

/// Process-wide factory built from [`RuntimeConfig::from_env`] on first use
pub fn global_factory() -> Result<Arc<ModelFactory>> {
    GLOBAL_FACTORY
        .get_or_try_init(|| default_factory(&RuntimeConfig::from_env()).map(Arc::new))
        .cloned()
}
