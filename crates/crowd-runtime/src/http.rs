//! Shared HTTP plumbing for the provider adapters

use std::time::Duration;

use crowd_core::{AgentError, Parameters, ProviderKind, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Build the client shared by every adapter
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Send a JSON body and decode a JSON response, mapping failures onto
/// the generation error kinds
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: ProviderKind,
    request: RequestBuilder,
    body: &Value,
) -> Result<T> {
    let response = request.json(body).send().await.map_err(|e| {
        warn!(provider = %provider, error = %e, "Request failed");
        AgentError::unavailable(provider.as_str(), format!("Failed to send request: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(status_error(provider, status, &error_text));
    }

    debug!(provider = %provider, %status, "Response received");
    response.json().await.map_err(|e| {
        AgentError::provider(provider.as_str(), format!("Failed to parse response: {e}"))
    })
}

fn status_error(provider: ProviderKind, status: StatusCode, body: &str) -> AgentError {
    let message = format!("{} API request failed with status {status}: {body}", label(provider));
    warn!(provider = %provider, %status, "{message}");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(provider.to_string()),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(provider.to_string()),
        s if s.is_server_error() => AgentError::unavailable(provider.as_str(), message),
        _ => AgentError::provider(provider.as_str(), message),
    }
}

const fn label(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAi => "OpenAI",
        ProviderKind::Anthropic => "Anthropic",
        ProviderKind::Gemini => "Gemini",
        ProviderKind::Groq => "Groq",
        ProviderKind::OpenRouter => "OpenRouter",
    }
}

/// Split a string `system` entry off the parameters; everything else is
/// returned as a JSON object for the payload
pub(crate) fn split_system(parameters: &Parameters) -> (Option<String>, Map<String, Value>) {
    let mut rest: Map<String, Value> = parameters
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let system = match rest.get("system") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    if system.is_some() {
        rest.remove("system");
    }
    (system, rest)
}

/// Copy `extra` into `body` without replacing keys the adapter set itself
pub(crate) fn extend_payload(body: &mut Value, extra: Map<String, Value>) {
    if let Value::Object(payload) = body {
        for (key, value) in extra {
            payload.entry(key).or_insert(value);
        }
    }
}
