//! Agent run results

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::Parameters;

/// Normalized output of one agent run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Generated text
    pub content: String,

    /// Model identity, `provider/model_name`
    pub model: String,

    /// When generation finished
    pub timestamp: DateTime<Utc>,

    /// Prompt that produced this result
    pub prompt: String,

    /// Merged parameters sent to the model
    #[serde(default)]
    pub parameters: Parameters,
}

impl AgentResult {
    /// Write as indented JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a result written by [`AgentResult::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
