//! # crowd-runtime
//!
//! Concrete model adapters for the agents-crowd router.
//!
//! ## Providers
//!
//! - **OpenAI**, **Groq**, **OpenRouter**: chat completions wire format
//! - **Anthropic**: Messages API
//! - **Gemini**: `generateContent`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crowd_core::{Agent, AgentRunner};
//! use crowd_runtime::global_factory;
//!
//! let agent = Agent::new("assistant", "anthropic", "claude-3-haiku-20240307");
//! let mut runner = AgentRunner::new(agent, global_factory()?)?;
//! let result = runner.run("Hello", Default::default()).await?;
//! ```

pub mod anthropic;
pub mod config;
pub mod dispatch;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod tools;

pub use anthropic::AnthropicAdapter;
pub use config::{ProviderEndpoints, RuntimeConfig};
pub use dispatch::{default_constructors, default_factory, global_factory};
pub use gemini::GeminiAdapter;
pub use http::build_client;
pub use openai::OpenAiCompatAdapter;
pub use tools::{datetime_tool, register_builtin_tools};
