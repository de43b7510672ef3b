use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentRef;
use super::message::Message;
use super::task::TaskRef;

/// A mention waiting to be forwarded to the mentioned agent.
///
/// `delivered` means "processed by the sweeper or acknowledged", not "confirmed
/// by the agent runtime". `delivery_outcome` tells the two apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub message_id: Option<Uuid>,
    pub content: String,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivery_outcome: Option<DeliveryOutcome>,
    pub created_at: DateTime<Utc>,
}

/// How a notification left the pending queue.
///
/// - `Sent`: The agent runtime accepted it
/// - `Failed`: The runtime rejected it or was unreachable; not retried
/// - `Acknowledged`: Marked delivered through the API without a send attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
    Acknowledged,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Acknowledged => "acknowledged",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            "acknowledged" => Some(Self::Acknowledged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    #[serde(flatten)]
    pub message: Message,
    pub task: TaskRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationWithRelations {
    #[serde(flatten)]
    pub notification: Notification,
    pub agent: AgentRef,
    pub message: Option<NotificationMessage>,
}

/// Everything the sweeper needs to forward one notification.
#[derive(Debug, Clone)]
pub struct PendingNotification {
    pub notification: Notification,
    pub agent_name: String,
    pub session_key: String,
    pub task_id: Option<Uuid>,
    pub task_title: Option<String>,
    /// Display name of the message author.
    pub from_agent: Option<String>,
    pub message_content: Option<String>,
}

/// Query parameters for listing notifications. Newest 50 first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub undelivered: bool,
}

/// Bulk acknowledgement. At least one selector is required; both narrow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDeliveredInput {
    pub notification_ids: Option<Vec<Uuid>>,
    pub agent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkDeliveredResult {
    pub updated: usize,
}
