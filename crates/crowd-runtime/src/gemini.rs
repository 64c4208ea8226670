//! Google Gemini adapter (`generateContent`)

use async_trait::async_trait;
use crowd_core::{AgentError, ModelAdapter, Parameters, ProviderKind, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::http::{send_json, split_system};

pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiAdapter {
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

    /// Map generic parameter names onto `generationConfig` fields.
    /// Unknown parameters are not forwarded.
    fn generation_config(parameters: Map<String, Value>) -> Map<String, Value> {
        let mut config = Map::new();
        for (key, value) in parameters {
            let field = match key.as_str() {
                "temperature" => "temperature",
                "top_p" => "topP",
                "top_k" => "topK",
                "max_tokens" | "max_output_tokens" => "maxOutputTokens",
                "candidate_count" => "candidateCount",
                "stop" => {
                    let sequences = match value {
                        Value::String(s) => json!([s]),
                        other => other,
                    };
                    config.insert("stopSequences".into(), sequences);
                    continue;
                }
                _ => {
                    debug!(parameter = %key, "Ignoring parameter unsupported by Gemini");
                    continue;
                }
            };
            config.insert(field.into(), value);
        }
        config
    }
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, parameters: &Parameters) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let (system, extra) = split_system(parameters);

        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
        });
        if let Some(system) = system {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        let config = Self::generation_config(extra);
        if !config.is_empty() {
            body["generationConfig"] = Value::Object(config);
        }

        debug!(model = %self.model, "Gemini request");

        let request = self.client.post(&url).header("x-goog-api-key", &self.api_key);
        let response: GenerateContentResponse =
            send_json(ProviderKind::Gemini, request, &body).await?;

        debug!(candidates = response.candidates.len(), "Gemini response");

        let text: Vec<String> = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AgentError::provider("gemini", "Response contained no candidates"));
        }
        Ok(text.concat())
    }
}

// ── Wire types ──

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}
