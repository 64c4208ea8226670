//! OpenAI-compatible adapter
//!
//! Serves OpenAI, Groq and OpenRouter, which share the chat completions wire
//! format and differ only in base URL.

use async_trait::async_trait;
use crowd_core::{AgentError, ModelAdapter, Parameters, ProviderKind, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::http::{extend_payload, send_json, split_system};

/// Chat completions adapter
pub struct OpenAiCompatAdapter {
    client: Client,
    provider: ProviderKind,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiCompatAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatAdapter")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatAdapter {
    /// - `provider`: which provider this instance speaks for
    /// - `base_url`: endpoint root, e.g. `https://api.groq.com/openai/v1`
    pub fn new(
        client: Client,
        provider: ProviderKind,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            provider,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ModelAdapter for OpenAiCompatAdapter {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, parameters: &Parameters) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let (system, extra) = split_system(parameters);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        extend_payload(&mut body, extra);

        debug!(provider = %self.provider, model = %self.model, "Chat completion request");

        let request = self.client.post(&url).bearer_auth(&self.api_key);
        let completion: ChatCompletion = send_json(self.provider, request, &body).await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                AgentError::provider(self.provider.as_str(), "Response contained no content")
            })
    }
}

// ── Wire types ──

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
