//! Anthropic Messages API adapter

use async_trait::async_trait;
use crowd_core::{AgentError, ModelAdapter, Parameters, ProviderKind, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::http::{extend_payload, send_json, split_system};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u64 = 1024;

pub struct AnthropicAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for AnthropicAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicAdapter")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnthropicAdapter {
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, parameters: &Parameters) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let (system, mut extra) = split_system(parameters);

        // max_tokens is mandatory for this API
        let max_tokens = extra
            .remove("max_tokens")
            .unwrap_or_else(|| Value::from(DEFAULT_MAX_TOKENS));

        let mut body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });
        if let Some(system) = system {
            body["system"] = Value::String(system);
        }
        extend_payload(&mut body, extra);

        debug!(model = %self.model, "Anthropic request");

        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION);
        let response: MessagesResponse =
            send_json(ProviderKind::Anthropic, request, &body).await?;

        debug!(
            blocks = response.content.len(),
            stop_reason = ?response.stop_reason,
            "Anthropic response"
        );

        let text: Vec<String> = response.content.into_iter().filter_map(|b| b.text).collect();
        if text.is_empty() {
            return Err(AgentError::provider("anthropic", "Response contained no text content"));
        }
        Ok(text.concat())
    }
}

// ── Wire types ──

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}
