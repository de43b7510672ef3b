use axum::{extract::State, Json};
use chrono::Utc;

use crate::api::error::{ok, ApiResult, Envelope};
use crate::api::AppState;
use crate::models::StandupReport;

pub async fn standup(State(state): State<AppState>) -> ApiResult<Json<Envelope<StandupReport>>> {
    Ok(ok(state.db.standup(Utc::now())?))
}
