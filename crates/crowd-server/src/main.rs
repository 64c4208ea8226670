//! agents-crowd HTTP Server
//!
//! Axum-based server exposing the multi-provider LLM router: one-shot
//! generation, stored agents with model switching, and tool invocation.

mod app;
mod config;
mod handlers;
mod logging;
mod state;
mod store;

use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use crowd_core::ToolRegistry;
use crowd_runtime::RuntimeConfig;

use crate::config::{RuntimePaths, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    // Runtime directory and logging
    let paths = RuntimePaths::create(&config.runtime_dir, Local::now())
        .with_context(|| {
            format!("Failed to create runtime directory for {}", config.runtime_dir.display())
        })?;
    logging::init(&paths.log_file())?;
    tracing::info!(root = %paths.root.display(), "Runtime directory ready");

    // Model factory with a bounded cache
    let factory = crowd_runtime::default_factory(&RuntimeConfig::from_env())?;
    let factory = Arc::new(config.bound_cache(factory));
    tracing::info!(
        cache_capacity = %config.cache_capacity,
        "Providers: {:?}",
        factory.supported_providers()
    );

    // Initialize tools
    let tools = Arc::new(ToolRegistry::new());
    crowd_runtime::register_builtin_tools(&tools)?;
    tracing::info!("Registered {} tools: {}", tools.len(), tools.names().join(", "));

    let bind_addr = config.bind_addr.clone();
    let app = app::router(AppState::new(factory, tools, config, paths));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("agents-crowd server running on http://{}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                  - Health check");
    tracing::info!("  POST   /generate                - One-shot generation");
    tracing::info!("  POST   /agents                  - Create agent");
    tracing::info!("  GET    /agents                  - List agents");
    tracing::info!("  POST   /agents/{{id}}/run         - Run agent");
    tracing::info!("  POST   /agents/{{id}}/model       - Switch model");
    tracing::info!("  POST   /agents/{{id}}/save        - Save last result");
    tracing::info!("  DELETE /agents/{{id}}             - Delete agent");
    tracing::info!("  GET    /tools                   - List tools");

    axum::serve(listener, app).await?;

    Ok(())
}
