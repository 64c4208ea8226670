//! Agent identity record

use serde::{Deserialize, Serialize};

use crate::provider::Parameters;

fn default_agent_type() -> String {
    "chat".into()
}

/// Describes which provider/model an agent runs on and with what parameters
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    /// Display name
    pub name: String,

    /// Type tag (e.g. "chat", "text_agent")
    #[serde(rename = "type", default = "default_agent_type")]
    pub agent_type: String,

    /// Provider identifier ("openai", "anthropic", ...)
    pub provider: String,

    /// Provider-specific model name
    pub model_name: String,

    /// Explicit API key; resolved from configuration when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default generation parameters for every run
    #[serde(default)]
    pub parameters: Parameters,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            agent_type: default_agent_type(),
            provider: provider.into(),
            model_name: model_name.into(),
            api_key: None,
            parameters: Parameters::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = agent_type.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("type", &self.agent_type)
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "**redacted**"))
            .field("parameters", &self.parameters)
            .finish()
    }
}
