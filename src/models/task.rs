use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::activity::ActivityWithRelations;
use super::agent::Agent;
use super::document::DocumentWithRelations;
use super::message::MessageWithAgent;

/// A unit of work on the kanban board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_by_id: Uuid,
    /// The agent actively working the task right now, if any.
    pub current_agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Position of a task in the pipeline.
///
/// The order below is the board's column order. It is a label set, not a state
/// machine: any status may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Inbox,
    Assigned,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        Self::Inbox,
        Self::Assigned,
        Self::InProgress,
        Self::Review,
        Self::Done,
        Self::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inbox" => Some(Self::Inbox),
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Join row between a task and an assigned agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub agent_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentWithAgent {
    #[serde(flatten)]
    pub assignment: TaskAssignment,
    pub agent: Agent,
}

/// Minimal task info embedded in other responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
}

/// A task with its creator, current agent and assignees, as shown on the board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithRelations {
    #[serde(flatten)]
    pub task: Task,
    pub created_by: Agent,
    pub current_agent: Option<Agent>,
    pub assignments: Vec<AssignmentWithAgent>,
}

impl TaskWithRelations {
    pub fn assignee_ids(&self) -> Vec<Uuid> {
        self.assignments.iter().map(|a| a.agent.id).collect()
    }
}

/// Full task view with its thread, documents and recent activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: TaskWithRelations,
    pub messages: Vec<MessageWithAgent>,
    pub documents: Vec<DocumentWithRelations>,
    /// The 20 most recent activities, newest first.
    pub activities: Vec<ActivityWithRelations>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `Medium`.
    pub priority: Option<TaskPriority>,
    /// Falls back to the coordinator agent when omitted.
    pub created_by_id: Option<Uuid>,
    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,
}

/// Partial task update.
///
/// `assignee_ids`, when present, replaces the whole assignment set.
/// `description` and `current_agent_id` accept `null` to clear the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_ids: Option<Vec<Uuid>>,
    #[serde(
        default,
        deserialize_with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_agent_id: Option<Option<Uuid>>,
}

/// Query parameters for listing tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
}
