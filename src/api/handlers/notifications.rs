use axum::{extract::State, Json};

use crate::api::error::{ok, ApiError, ApiResult, Envelope};
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::AppState;
use crate::models::*;
use crate::sweeper::{self, SweepReport};

pub async fn list_notifications(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
) -> ApiResult<Json<Envelope<Vec<NotificationWithRelations>>>> {
    Ok(ok(state.db.list_notifications(&filter)?))
}

/// Acknowledge notifications by id list and/or recipient.
pub async fn mark_delivered(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MarkDeliveredInput>,
) -> ApiResult<Json<Envelope<MarkDeliveredResult>>> {
    if input.notification_ids.is_none() && input.agent_id.is_none() {
        return Err(ApiError::validation("notificationIds or agentId is required"));
    }

    let updated = state.db.mark_delivered(&input)?;
    Ok(ok(MarkDeliveredResult { updated }))
}

/// Run one delivery sweep now.
pub async fn process_notifications(State(state): State<AppState>) -> ApiResult<Json<Envelope<SweepReport>>> {
    let report =
        sweeper::process_pending(&state.db, &state.gateway, state.config.sweep_batch_size).await?;
    Ok(ok(report))
}
