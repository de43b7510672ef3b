use axum::{extract::State, http::StatusCode, Json};

use crate::api::error::{created, ok, ApiError, ApiResult, Envelope};
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::AppState;
use crate::events::EventType;
use crate::models::*;

pub async fn list_activities(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ActivityFilter>,
) -> ApiResult<Json<Envelope<Vec<ActivityWithRelations>>>> {
    Ok(ok(state.db.list_activities(&filter)?))
}

pub async fn create_activity(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateActivityInput>,
) -> ApiResult<(StatusCode, Json<Envelope<ActivityWithRelations>>)> {
    if input.activity_type.trim().is_empty() || input.message.trim().is_empty() {
        return Err(ApiError::validation("type and message are required"));
    }
    if state.db.get_agent(input.agent_id)?.is_none() {
        return Err(ApiError::not_found("Agent"));
    }
    if let Some(task_id) = input.task_id {
        if state.db.get_task(task_id)?.is_none() {
            return Err(ApiError::not_found("Task"));
        }
    }

    let activity = state.db.create_activity(input)?;
    state.events.emit(EventType::ActivityCreated, &activity);
    Ok(created(activity))
}
