//! # crowd-core
//!
//! Provider-agnostic agent execution: a factory that hands out cached model
//! adapters, a registry of callable tools and a runner that drives one agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AgentRunner                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │    Agent    │  │ModelFactory │  │   ModelAdapter      │  │
//! │  │   record    │──│  + cache    │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ModelAdapter` trait hides OpenAI, Anthropic, Gemini, Groq and
//! OpenRouter behind a single `generate` call. Concrete adapters live in
//! `crowd-runtime`; this crate only knows the dispatch table.

pub mod agent;
pub mod config;
pub mod error;
pub mod factory;
pub mod provider;
pub mod result;
pub mod runner;
pub mod tool;

#[cfg(test)]
mod testing;

pub use agent::Agent;
pub use config::{ApiKeyResolver, EnvApiKeys, StaticApiKeys};
pub use error::{AgentError, Result};
pub use factory::{AdapterConstructor, ModelFactory, ModelSpec};
pub use provider::{ModelAdapter, Parameters, ProviderKind, merge_parameters};
pub use result::AgentResult;
pub use runner::{AgentRunner, RunStatus};
pub use tool::{
    FnTool, Tool, ToolContext, ToolDescriptor, ToolRegistry, global_registry, register_tool,
};
