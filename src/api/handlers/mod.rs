pub mod activities;
pub mod agents;
pub mod dashboard;
pub mod documents;
pub mod events;
pub mod messages;
pub mod notifications;
pub mod standup;
pub mod tasks;

use axum::{extract::State, Json};
use serde_json::json;

use super::AppState;

// ============================================================
// Health
// ============================================================

/// Liveness plus a reachability probe of the agent runtime.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let runtime = match state.gateway.status().await {
        Ok(status) => json!({
            "url": state.gateway.base_url(),
            "connected": status.running,
            "version": status.version,
        }),
        Err(e) => {
            tracing::debug!("Agent runtime unreachable: {}", e);
            json!({
                "url": state.gateway.base_url(),
                "connected": false,
            })
        }
    };

    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "openclaw": runtime,
        }
    }))
}
