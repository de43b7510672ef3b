use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::TaskRef;

/// A named AI agent tracked by Mission Control.
///
/// Agents are not executed here. The external runtime owns them and is reached
/// through `session_key`; this record only mirrors what the dashboard needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    /// Unique handle used for `@name` mentions.
    pub name: String,
    pub display_name: String,
    pub role: String,
    /// Address of the agent's session in the external runtime.
    pub session_key: String,
    pub status: AgentStatus,
    pub current_task_id: Option<Uuid>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Active,
    Blocked,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "active" => Some(Self::Active),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

/// Minimal agent info embedded in notification and document responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRef {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub role: String,
}

impl From<&Agent> for AgentRef {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name.clone(),
            display_name: agent.display_name.clone(),
            role: agent.role.clone(),
        }
    }
}

/// Roster entry returned by the agent list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    #[serde(flatten)]
    pub agent: Agent,
    pub current_task: Option<TaskRef>,
    pub counts: AgentCounts,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentCounts {
    /// Tasks this agent created.
    pub created_tasks: i64,
    pub assignments: i64,
    pub messages: i64,
}

/// Input for registering an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentInput {
    pub name: String,
    pub display_name: String,
    pub role: String,
    pub session_key: String,
    /// Defaults to `Idle`.
    pub status: Option<AgentStatus>,
}

/// Status and heartbeat update, as reported by the agent runtime.
///
/// `current_task_id` accepts an explicit `null` to clear the current task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentInput {
    pub id: Uuid,
    pub status: Option<AgentStatus>,
    #[serde(
        default,
        deserialize_with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_task_id: Option<Option<Uuid>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
}
