use axum::{extract::State, http::StatusCode, Json};

use crate::api::error::{created, ok, ApiError, ApiResult, Envelope};
use crate::api::extract::ApiJson;
use crate::api::AppState;
use crate::events::EventType;
use crate::models::*;

pub async fn list_agents(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<AgentSummary>>>> {
    Ok(ok(state.db.list_agents()?))
}

pub async fn create_agent(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateAgentInput>,
) -> ApiResult<(StatusCode, Json<Envelope<Agent>>)> {
    if [&input.name, &input.display_name, &input.role, &input.session_key]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        return Err(ApiError::validation(
            "name, displayName, role and sessionKey are required",
        ));
    }
    let name = input.name.clone();
    let Some(agent) = state.db.create_agent(input)? else {
        return Err(ApiError::validation(format!(
            "Agent name already taken: {}",
            name
        )));
    };
    tracing::info!("Created agent @{}", agent.name);
    Ok(created(agent))
}

/// Status, heartbeat and current-task update. The agent id travels in the body.
pub async fn update_agent(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UpdateAgentInput>,
) -> ApiResult<Json<Envelope<Agent>>> {
    if let Some(Some(task_id)) = input.current_task_id {
        if state.db.get_task(task_id)?.is_none() {
            return Err(ApiError::not_found("Task"));
        }
    }

    let agent = state
        .db
        .update_agent(input)?
        .ok_or_else(|| ApiError::not_found("Agent"))?;

    state.events.emit(EventType::AgentUpdated, &agent);
    Ok(ok(agent))
}
