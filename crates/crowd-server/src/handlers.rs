//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crowd_core::{
    Agent, AgentError, AgentResult, AgentRunner, Parameters, ProviderKind, ToolContext,
    ToolDescriptor,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::state::AppState;
use crate::store::AgentInfo;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::AgentNotFound(_) => (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Agent(e) if e.is_configuration() => {
                (StatusCode::BAD_REQUEST, "CONFIGURATION_ERROR")
            }
            Self::Agent(AgentError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            Self::Agent(e) if e.is_generation() => (StatusCode::BAD_GATEWAY, "GENERATION_ERROR"),
            Self::Agent(AgentError::ToolNotFound(_)) => (StatusCode::NOT_FOUND, "TOOL_NOT_FOUND"),
            Self::Agent(AgentError::DuplicateTool(_)) => (StatusCode::CONFLICT, "DUPLICATE_NAME"),
            Self::Agent(AgentError::NoResult) => (StatusCode::CONFLICT, "NO_RESULT"),
            Self::Agent(AgentError::ToolExecution(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TOOL_ERROR")
            }
            Self::Agent(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = match &self {
            Self::Agent(e) => ErrorResponse {
                error: e.user_message(),
                code,
                details: Some(e.to_string()),
            },
            other => ErrorResponse {
                error: other.to_string(),
                code,
                details: None,
            },
        };

        if status.is_server_error() {
            error!(%status, code, "{self}");
        } else {
            warn!(%status, code, "{self}");
        }
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub providers: Vec<ProviderKind>,
    pub agents: usize,
    pub tools: usize,
    pub cached_models: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub agent_id: String,
    pub name: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AgentList {
    pub agents: Vec<AgentInfo>,
}

#[derive(Debug, Serialize)]
pub struct AgentDetail {
    #[serde(flatten)]
    pub info: AgentInfo,
    pub last_result: Option<AgentResult>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub prompt: String,
    #[serde(default)]
    pub parameters: Parameters,
}

#[derive(Debug, Deserialize)]
pub struct SetModelRequest {
    pub provider: String,
    pub model_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct InvokeToolRequest {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub arguments: Parameters,
}

#[derive(Debug, Serialize)]
pub struct InvokeToolResponse {
    pub tool: String,
    pub result: Value,
}

// ============================================================================
// Handlers
// ============================================================================

/// Service info
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "agents-crowd",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /health",
            "POST /generate",
            "POST /agents",
            "GET /agents",
            "GET /agents/{agent_id}",
            "POST /agents/{agent_id}/run",
            "POST /agents/{agent_id}/model",
            "POST /agents/{agent_id}/save",
            "DELETE /agents/{agent_id}",
            "GET /tools",
            "POST /tools/{name}/invoke"
        ]
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        providers: state.factory.supported_providers(),
        agents: state.agents.len().await,
        tools: state.tools.len(),
        cached_models: state.factory.cached_models(),
    })
}

/// One-shot generation without a stored agent
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> ApiResult<Json<AgentResult>> {
    let provider = payload
        .provider
        .unwrap_or_else(|| state.config.default_provider.clone());
    let model_name = payload
        .model_name
        .unwrap_or_else(|| state.config.default_model.clone());

    let mut agent = Agent::new("generate", provider, model_name);
    agent.api_key = payload.api_key;

    let mut runner = AgentRunner::new(agent, state.factory.clone())?;
    let result = runner
        .run_with_timeout(&payload.prompt, payload.parameters, state.config.request_timeout)
        .await?;
    Ok(Json(result))
}

pub async fn create_agent(
    State(state): State<AppState>,
    Json(agent): Json<Agent>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    if agent.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Agent name must not be empty".into()));
    }

    let runner = AgentRunner::new(agent, state.factory.clone())?;
    let entry = state.agents.insert(runner).await;
    info!(agent_id = %entry.id, name = %entry.name, "Created agent");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            agent_id: entry.id.clone(),
            name: entry.name.clone(),
            status: "created",
        }),
    ))
}

pub async fn list_agents(State(state): State<AppState>) -> Json<AgentList> {
    let mut agents = Vec::new();
    for entry in state.agents.list().await {
        agents.push(entry.info().await);
    }
    Json(AgentList { agents })
}

pub async fn get_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<AgentDetail>> {
    let entry = state
        .agents
        .get(&agent_id)
        .await
        .ok_or(ApiError::AgentNotFound(agent_id))?;

    Ok(Json(AgentDetail {
        info: entry.info().await,
        last_result: entry.last_result().await,
    }))
}

/// Run a stored agent; concurrent runs of one agent queue behind each other
pub async fn run_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(payload): Json<RunRequest>,
) -> ApiResult<Json<AgentResult>> {
    let entry = state
        .agents
        .get(&agent_id)
        .await
        .ok_or(ApiError::AgentNotFound(agent_id))?;

    let mut runner = entry.runner.lock().await;
    let result = runner
        .run_with_timeout(&payload.prompt, payload.parameters, state.config.request_timeout)
        .await?;
    entry.sync(&runner).await;
    Ok(Json(result))
}

pub async fn set_model(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(payload): Json<SetModelRequest>,
) -> ApiResult<Json<AgentInfo>> {
    let entry = state
        .agents
        .get(&agent_id)
        .await
        .ok_or(ApiError::AgentNotFound(agent_id))?;

    let mut runner = entry.runner.lock().await;
    runner.set_model(&payload.provider, &payload.model_name, payload.api_key)?;
    entry.sync(&runner).await;
    drop(runner);

    Ok(Json(entry.info().await))
}

/// Persist the last result under the runtime outputs directory
pub async fn save_result(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<SavedResponse>> {
    let entry = state
        .agents
        .get(&agent_id)
        .await
        .ok_or(ApiError::AgentNotFound(agent_id))?;

    let file_name = format!("{}-{}.json", entry.id, chrono::Utc::now().timestamp());
    let path = state.paths.outputs.join(&file_name);
    if path.parent() != Some(state.paths.outputs.as_path()) {
        return Err(ApiError::BadRequest(format!("Invalid output file name: {file_name}")));
    }
    entry.runner.lock().await.save_result(&path)?;

    Ok(Json(SavedResponse {
        path: path.display().to_string(),
    }))
}

pub async fn delete_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let entry = state
        .agents
        .remove(&agent_id)
        .await
        .ok_or(ApiError::AgentNotFound(agent_id))?;

    info!(agent_id = %entry.id, "Deleted agent");
    Ok(Json(json!({"agent_id": entry.id, "status": "deleted"})))
}

pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.tools.list_tools())
}

pub async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<InvokeToolRequest>,
) -> ApiResult<Json<InvokeToolResponse>> {
    let context = match payload.agent_id {
        Some(agent_id) => {
            let entry = state
                .agents
                .get(&agent_id)
                .await
                .ok_or(ApiError::AgentNotFound(agent_id))?;
            entry.runner.lock().await.tool_context()
        }
        None => ToolContext::default(),
    };

    let result = state.tools.execute(&name, &context, &payload.arguments).await?;
    Ok(Json(InvokeToolResponse { tool: name, result }))
}
