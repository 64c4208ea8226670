//! Router assembly

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    create_agent, delete_agent, generate, get_agent, health_check, invoke_tool, list_agents,
    list_tools, root, run_agent, save_result, set_model,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/", get(root))
        .route("/health", get(health_check))

        // One-shot generation
        .route("/generate", post(generate))

        // Agents
        .route("/agents", post(create_agent).get(list_agents))
        .route("/agents/{agent_id}", get(get_agent).delete(delete_agent))
        .route("/agents/{agent_id}/run", post(run_agent))
        .route("/agents/{agent_id}/model", post(set_model))
        .route("/agents/{agent_id}/save", post(save_result))

        // Tools
        .route("/tools", get(list_tools))
        .route("/tools/{name}/invoke", post(invoke_tool))

        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
