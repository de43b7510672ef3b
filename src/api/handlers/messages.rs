use axum::{extract::State, http::StatusCode, Json};

use crate::api::error::{created, ok, ApiError, ApiResult, Envelope};
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::AppState;
use crate::events::EventType;
use crate::mentions;
use crate::models::*;

/// Thread of one task, oldest first. `taskId` is required.
pub async fn list_messages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MessageQuery>,
) -> ApiResult<Json<Envelope<Vec<MessageWithAgent>>>> {
    let task_id = query
        .task_id
        .ok_or_else(|| ApiError::validation("taskId is required"))?;
    Ok(ok(state.db.get_messages(task_id)?))
}

/// Post a comment, notify mentioned agents and subscribe participants.
///
/// When `mentions` is omitted the `@name` handles in the content are resolved
/// against the roster.
pub async fn create_message(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateMessageInput>,
) -> ApiResult<(StatusCode, Json<Envelope<MessageWithAgent>>)> {
    if input.content.trim().is_empty() {
        return Err(ApiError::validation("content is required"));
    }
    if state.db.get_task(input.task_id)?.is_none() {
        return Err(ApiError::not_found("Task"));
    }
    if state.db.get_agent(input.agent_id)?.is_none() {
        return Err(ApiError::not_found("Agent"));
    }

    let mentioned = match input.mentions {
        Some(ids) => ids,
        None => mentions::resolve_content(&input.content, &state.db.get_all_agents()?),
    };

    let posted = state
        .db
        .create_message(input.task_id, input.agent_id, &input.content, &mentioned)?;

    tracing::debug!(
        "Message {} on task {} queued {} notification(s)",
        posted.message.message.id,
        input.task_id,
        posted.notifications.len()
    );

    state.events.emit(EventType::MessageSent, &posted.message);
    Ok(created(posted.message))
}
