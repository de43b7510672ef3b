use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentRef;
use super::task::TaskRef;

/// Activity type tags written by Mission Control itself.
///
/// The `type` column is open: external integrations may post any tag.
pub mod kind {
    pub const TASK_CREATED: &str = "task_created";
    pub const TASK_ASSIGNED: &str = "task_assigned";
    pub const STATUS_CHANGED: &str = "status_changed";
    pub const MESSAGE_SENT: &str = "message_sent";
    pub const DOCUMENT_CREATED: &str = "document_created";
}

/// An append-only entry in the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub agent_id: Uuid,
    pub task_id: Option<Uuid>,
    /// Human-readable line shown in the feed.
    pub message: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithRelations {
    #[serde(flatten)]
    pub activity: Activity,
    pub agent: AgentRef,
    pub task: Option<TaskRef>,
}

/// Input for recording an activity from an external integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityInput {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub agent_id: Uuid,
    pub task_id: Option<Uuid>,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
}

/// Query parameters for reading the feed. Newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    /// Defaults to 50.
    pub limit: Option<u32>,
    pub task_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    /// Only activities created at or after this instant.
    pub since: Option<DateTime<Utc>>,
}
