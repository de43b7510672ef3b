use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use uuid::Uuid;

use crate::api::error::{created, ok, ApiError, ApiResult, Envelope};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::AppState;
use crate::db::COORDINATOR_NAME;
use crate::events::EventType;
use crate::models::*;

pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> ApiResult<Json<Envelope<Vec<TaskWithRelations>>>> {
    Ok(ok(state.db.list_tasks(&filter)?))
}

pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Envelope<TaskDetail>>> {
    let detail = state
        .db
        .get_task_detail(id)?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    Ok(ok(detail))
}

pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<Envelope<TaskWithRelations>>)> {
    if input.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    ensure_agents_exist(&state, &input.assignee_ids)?;

    let created_by_id = match input.created_by_id {
        Some(id) => {
            state
                .db
                .get_agent(id)?
                .ok_or_else(|| ApiError::not_found("Agent"))?;
            id
        }
        None => default_creator(&state)?,
    };

    let task = state.db.create_task(input, created_by_id)?;
    tracing::info!("Created task {} \"{}\"", task.task.id, task.task.title);

    state.events.emit(EventType::TaskCreated, &task);
    Ok(created(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateTaskInput>,
) -> ApiResult<Json<Envelope<TaskWithRelations>>> {
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::validation("title cannot be empty"));
    }
    if let Some(assignee_ids) = &input.assignee_ids {
        ensure_agents_exist(&state, assignee_ids)?;
    }
    if let Some(Some(agent_id)) = input.current_agent_id {
        ensure_agents_exist(&state, &[agent_id])?;
    }

    let update = state
        .db
        .update_task(id, input)?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    if let Some(change) = &update.status_change {
        tracing::debug!("Task {}: {}", id, change.message);
    }

    state.events.emit(EventType::TaskUpdated, &update.task);
    if update.assignments.is_some() {
        state.events.emit(
            EventType::TaskAssigned,
            &json!({
                "taskId": id,
                "assigneeIds": update.task.assignee_ids(),
            }),
        );
    }
    Ok(ok(update.task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Envelope<Task>>> {
    let task = state
        .db
        .delete_task(id)?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    tracing::info!("Deleted task {} \"{}\"", task.id, task.title);
    state.events.emit(EventType::TaskDeleted, &task);
    Ok(ok(task))
}

fn ensure_agents_exist(state: &AppState, ids: &[Uuid]) -> ApiResult<()> {
    let missing = state.db.find_missing_agents(ids)?;
    if missing.is_empty() {
        return Ok(());
    }
    let ids: Vec<String> = missing.iter().map(Uuid::to_string).collect();
    Err(ApiError::validation(format!("Unknown agent(s): {}", ids.join(", "))))
}

/// The coordinator owns tasks created without a creator; any agent will do otherwise.
fn default_creator(state: &AppState) -> ApiResult<Uuid> {
    if let Some(agent) = state.db.get_agent_by_name(COORDINATOR_NAME)? {
        return Ok(agent.id);
    }
    state
        .db
        .get_all_agents()?
        .first()
        .map(|a| a.id)
        .ok_or_else(|| ApiError::validation("No agents available to own the task"))
}
