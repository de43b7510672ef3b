use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::api::error::{created, ok, ApiError, ApiResult, Envelope};
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::AppState;
use crate::events::EventType;
use crate::models::*;

pub async fn list_documents(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<DocumentFilter>,
) -> ApiResult<Json<Envelope<Vec<DocumentWithRelations>>>> {
    Ok(ok(state.db.list_documents(&filter)?))
}

pub async fn create_document(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateDocumentInput>,
) -> ApiResult<(StatusCode, Json<Envelope<DocumentWithRelations>>)> {
    if input.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if state.db.get_agent(input.agent_id)?.is_none() {
        return Err(ApiError::not_found("Agent"));
    }
    if let Some(task_id) = input.task_id {
        if state.db.get_task(task_id)?.is_none() {
            return Err(ApiError::not_found("Task"));
        }
    }

    let (document, _activity) = state.db.create_document(input)?;
    state.events.emit(EventType::DocumentCreated, &document);
    Ok(created(document))
}

pub async fn update_document(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UpdateDocumentInput>,
) -> ApiResult<Json<Envelope<DocumentWithRelations>>> {
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::validation("title cannot be empty"));
    }

    let document = state
        .db
        .update_document(input)?
        .ok_or_else(|| ApiError::not_found("Document"))?;

    state.events.emit(EventType::DocumentUpdated, &document);
    Ok(ok(document))
}

/// `DELETE /documents?id=`
pub async fn delete_document(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DocumentIdQuery>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let id = query
        .id
        .ok_or_else(|| ApiError::validation("Document ID is required"))?;

    if !state.db.delete_document(id)? {
        return Err(ApiError::not_found("Document"));
    }

    let data = json!({ "id": id });
    state.events.emit(EventType::DocumentDeleted, &data);
    Ok(ok(data))
}
