//! Scripted adapters for unit tests
//!
//! Behaviour is chosen by model name prefix:
//! - `fail-*`   returns a provider error
//! - `slow-*`   sleeps for a second before answering
//! - `params-*` answers with the JSON of the parameters it received
//! - anything else answers `"<full name>: <prompt>"`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::StaticApiKeys;
use crate::error::{AgentError, Result};
use crate::factory::{ModelFactory, ModelSpec};
use crate::provider::{ModelAdapter, Parameters, ProviderKind};

pub struct ScriptedAdapter {
    provider: ProviderKind,
    model_name: String,
}

impl ScriptedAdapter {
    pub fn from_spec(spec: &ModelSpec) -> Arc<dyn ModelAdapter> {
        Arc::new(Self {
            provider: spec.provider,
            model_name: spec.model_name.clone(),
        })
    }
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, prompt: &str, parameters: &Parameters) -> Result<String> {
        if self.model_name.starts_with("fail-") {
            return Err(AgentError::provider(
                self.provider.as_str(),
                "scripted failure",
            ));
        }
        if self.model_name.starts_with("slow-") {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        if self.model_name.starts_with("params-") {
            return Ok(serde_json::to_string(parameters)?);
        }
        Ok(format!("{}: {prompt}", self.full_name()))
    }
}

/// Factory with scripted constructors for every provider and keys for all
/// of them except OpenRouter
pub fn scripted_factory() -> ModelFactory {
    let keys = StaticApiKeys::new()
        .with_key(ProviderKind::OpenAi, "sk-openai")
        .with_key(ProviderKind::Anthropic, "sk-ant")
        .with_key(ProviderKind::Gemini, "gm-key")
        .with_key(ProviderKind::Groq, "gsk-key");

    ProviderKind::ALL
        .into_iter()
        .fold(ModelFactory::new(Arc::new(keys)), |factory, kind| {
            factory.with_constructor(kind, |spec| Ok(ScriptedAdapter::from_spec(spec)))
        })
}
