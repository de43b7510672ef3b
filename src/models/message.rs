use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::Agent;

/// A comment on a task thread. Messages are never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub task_id: Uuid,
    pub agent_id: Uuid,
    pub content: String,
    /// Agents mentioned in `content`, resolved at creation time.
    pub mentions: Option<Vec<Uuid>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageWithAgent {
    #[serde(flatten)]
    pub message: Message,
    pub agent: Agent,
}

/// Input for posting a comment.
///
/// When `mentions` is omitted the server resolves `@name` tokens in `content`
/// against the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageInput {
    pub task_id: Uuid,
    pub agent_id: Uuid,
    pub content: String,
    pub mentions: Option<Vec<Uuid>>,
}

/// A durable marker that an agent takes part in a task thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSubscription {
    pub id: Uuid,
    pub task_id: Uuid,
    pub agent_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for reading a thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub task_id: Option<Uuid>,
}
