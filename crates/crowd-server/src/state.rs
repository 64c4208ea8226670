//! Application State

use std::sync::Arc;

use crowd_core::{ModelFactory, ToolRegistry};

use crate::config::{RuntimePaths, ServerConfig};
use crate::store::AgentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Model factory with the provider dispatch table
    pub factory: Arc<ModelFactory>,

    /// Tools callable through the API
    pub tools: Arc<ToolRegistry>,

    /// Agents created through the API
    pub agents: Arc<AgentStore>,

    pub config: Arc<ServerConfig>,

    /// Where saved results are written
    pub paths: Arc<RuntimePaths>,
}

impl AppState {
    pub fn new(
        factory: Arc<ModelFactory>,
        tools: Arc<ToolRegistry>,
        config: ServerConfig,
        paths: RuntimePaths,
    ) -> Self {
        Self {
            factory,
            tools,
            agents: Arc::new(AgentStore::new()),
            config: Arc::new(config),
            paths: Arc::new(paths),
        }
    }
}
