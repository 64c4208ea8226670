//! Tool System
//!
//! Named, invocable capabilities an agent may call. Tools are registered
//! explicitly at startup and looked up by name afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AgentError, Result};
use crate::provider::Parameters;

/// Per-invocation context handed to a tool
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolContext {
    /// Agent executing the tool
    pub agent_name: String,

    /// Model the agent is running on
    pub model_name: String,

    /// Agent parameters at invocation time
    #[serde(default)]
    pub parameters: Parameters,
}

impl ToolContext {
    pub fn new(agent_name: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            model_name: model_name.into(),
            parameters: Parameters::new(),
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Lightweight tool listing entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool identifier
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Execute the tool with given arguments
    async fn execute(&self, context: &ToolContext, arguments: &Parameters) -> Result<Value>;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

type ToolFn = dyn Fn(&ToolContext, &Parameters) -> Result<Value> + Send + Sync;

/// Binds an ordinary function to a tool name and description
pub struct FnTool {
    name: String,
    description: String,
    function: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, function: F) -> Self
    where
        F: Fn(&ToolContext, &Parameters) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            function: Box::new(function),
        }
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, context: &ToolContext, arguments: &Parameters) -> Result<Value> {
        (self.function)(context, arguments)
    }
}

/// Registry for available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool; an existing tool with the same name is kept
    pub fn register<T: Tool + 'static>(&self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&self, tool: Arc<dyn Tool>) -> Result<()> {
        let mut tools = self.tools.write();
        let name = tool.name().to_string();
        if tools.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        debug!(tool = %name, "Registered tool");
        tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// Snapshot of registered tools, sorted by name
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.read().values().map(|t| t.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Execute a tool by name
    pub async fn execute(
        &self,
        name: &str,
        context: &ToolContext,
        arguments: &Parameters,
    ) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        debug!(tool = %name, agent = %context.agent_name, "Executing tool");
        tool.execute(context, arguments).await
    }

    /// Get tool names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

static GLOBAL_REGISTRY: Lazy<ToolRegistry> = Lazy::new(ToolRegistry::new);

/// Process-wide registry, created on first access
pub fn global_registry() -> &'static ToolRegistry {
    &GLOBAL_REGISTRY
}

/// Wrap `function` as a tool and register it with the global registry
pub fn register_tool<F>(
    name: impl Into<String>,
    description: impl Into<String>,
    function: F,
) -> Result<Arc<dyn Tool>>
where
    F: Fn(&ToolContext, &Parameters) -> Result<Value> + Send + Sync + 'static,
{
    let tool: Arc<dyn Tool> = Arc::new(FnTool::new(name, description, function));
    global_registry().register_arc(Arc::clone(&tool))?;
    Ok(tool)
}
