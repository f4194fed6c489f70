//! Agent Routes
//!
//! CRUD, natural-language command processing, structured command execution,
//! performance, and the public marketplace listing. Every endpoint except
//! the marketplace requires authentication, and every per-agent endpoint
//! checks ownership before touching the record.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::agent::registry::overrides_from_value;
use crate::agent::types::{Agent, AgentCommand, AgentUpdate, MarketData};
use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::auth::models::AuthUser;
use crate::error::{ApiError, AuthError};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub settings: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessCommandRequest {
    pub command: Option<String>,
    pub market_data: Option<Vec<MarketData>>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteCommandRequest {
    #[serde(rename = "type")]
    pub command_type: Option<String>,
    pub parameters: Option<Map<String, Value>>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
}

/// Create agent routes. The marketplace listing is public; everything else
/// sits behind the auth middleware.
pub fn create_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_agent))
        .route("/", get(list_agents))
        .route("/{agent_id}", get(get_agent))
        .route("/{agent_id}", put(update_agent))
        .route("/{agent_id}", delete(delete_agent))
        .route("/{agent_id}/command", post(process_command))
        .route("/{agent_id}/execute", post(execute_command))
        .route("/{agent_id}/performance", get(get_performance))
        .layer(middleware::from_fn_with_state(
            jwt_service,
            AuthMiddleware::validate_token,
        ));

    Router::new()
        .route("/marketplace/public", get(marketplace_public))
        .merge(protected)
}

/// Fetch an agent and verify the caller owns it. Unknown id -> 404,
/// someone else's agent -> 403.
async fn owned_agent(state: &AppState, agent_id: &str, auth: &AuthUser) -> Result<Agent, ApiError> {
    let agent = state
        .agents
        .get(agent_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;

    if agent.user_id != auth.id {
        return Err(AuthError::AccessDenied.into());
    }

    Ok(agent)
}

/// POST /api/agents
async fn create_agent(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (name, description, prompt) = match (payload.name, payload.description, payload.prompt) {
        (Some(n), Some(d), Some(p))
            if !n.trim().is_empty() && !d.trim().is_empty() && !p.trim().is_empty() =>
        {
            (n, d, p)
        }
        _ => {
            return Err(ApiError::Validation(
                "Missing required fields: name, description, prompt".to_string(),
            ))
        }
    };

    let overrides = overrides_from_value(payload.settings).map_err(ApiError::Validation)?;

    let agent = state
        .agents
        .create(&auth.id, &name, &description, &prompt, overrides)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "agent": agent,
        })),
    ))
}

/// GET /api/agents
async fn list_agents(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let agents = state.agents.list_by_owner(&auth.id).await;
    Ok(Json(json!({
        "success": true,
        "agents": agents,
    })))
}

/// GET /api/agents/{agent_id}
async fn get_agent(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let agent = owned_agent(&state, &agent_id, &auth).await?;
    Ok(Json(json!({
        "success": true,
        "agent": agent,
    })))
}

/// PUT /api/agents/{agent_id}
async fn update_agent(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(agent_id): Path<String>,
    Json(payload): Json<AgentUpdate>,
) -> Result<Json<Value>, ApiError> {
    owned_agent(&state, &agent_id, &auth).await?;

    let agent = state
        .agents
        .update(&agent_id, payload)
        .await
        .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "agent": agent,
    })))
}

/// DELETE /api/agents/{agent_id} (logical deletion)
async fn delete_agent(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    owned_agent(&state, &agent_id, &auth).await?;
    state.agents.deactivate(&agent_id).await;

    Ok(Json(json!({
        "success": true,
        "message": "Agent deleted successfully",
    })))
}

/// POST /api/agents/{agent_id}/command
///
/// Interpret a natural-language instruction into structured commands.
/// Nothing is executed here; the caller reviews the proposals and submits
/// them to `/execute`.
async fn process_command(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(agent_id): Path<String>,
    Json(payload): Json<ProcessCommandRequest>,
) -> Result<Json<Value>, ApiError> {
    let command = match payload.command {
        Some(c) if !c.trim().is_empty() => c,
        _ => return Err(ApiError::Validation("Command is required".to_string())),
    };

    let agent = owned_agent(&state, &agent_id, &auth).await?;
    if !agent.is_active {
        return Err(ApiError::Validation("Agent is not active".to_string()));
    }

    let commands = state
        .interpreter
        .interpret(&agent, &command, payload.market_data.as_deref(), &state.actions)
        .await?;

    tracing::info!(
        "Interpreted {} command(s) for agent {}",
        commands.len(),
        agent_id
    );

    Ok(Json(json!({
        "success": true,
        "commands": commands,
    })))
}

/// POST /api/agents/{agent_id}/execute
async fn execute_command(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(agent_id): Path<String>,
    Json(payload): Json<ExecuteCommandRequest>,
) -> Result<Json<Value>, ApiError> {
    let (command_type, parameters) = match (payload.command_type, payload.parameters) {
        (Some(t), Some(p)) => (t, p),
        _ => {
            return Err(ApiError::Validation(
                "Command type and parameters are required".to_string(),
            ))
        }
    };

    let agent = owned_agent(&state, &agent_id, &auth).await?;
    if !agent.is_active {
        return Err(ApiError::Validation("Agent is not active".to_string()));
    }

    let command = AgentCommand {
        command_type,
        parameters,
        confidence: payload.confidence.unwrap_or(0.5),
        reasoning: payload
            .reasoning
            .unwrap_or_else(|| "No reasoning provided".to_string()),
    };

    let result = state.executor.execute(&agent_id, &command).await?;

    Ok(Json(json!({
        "success": true,
        "result": result,
    })))
}

/// GET /api/agents/{agent_id}/performance
async fn get_performance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let agent = owned_agent(&state, &agent_id, &auth).await?;
    Ok(Json(json!({
        "success": true,
        "performance": agent.performance,
    })))
}

/// GET /api/agents/marketplace/public (no auth)
async fn marketplace_public(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let agents = state.agents.list_public().await;
    Ok(Json(json!({
        "success": true,
        "agents": agents,
    })))
}
