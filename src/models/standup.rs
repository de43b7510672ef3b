use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentStatus;
use super::task::TaskStatus;

/// Daily standup built from the last 24 hours of activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandupReport {
    pub generated_at: DateTime<Utc>,
    /// Long-form date, e.g. "Monday, October 19, 2026".
    pub date: String,
    pub summary: StandupSummary,
    /// Task count per status, every status present.
    pub status_counts: BTreeMap<String, usize>,
    pub agents: Vec<StandupAgent>,
    pub completed_tasks: Vec<CompletedTask>,
    pub in_progress_tasks: Vec<ActiveTask>,
    pub review_tasks: Vec<ActiveTask>,
    pub blocked_tasks: Vec<BlockedTask>,
    pub recent_activities: Vec<StandupActivity>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StandupSummary {
    pub total_tasks: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub in_review: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandupAgent {
    pub name: String,
    pub role: String,
    pub status: AgentStatus,
    pub current_task: Option<String>,
    /// Activities by this agent in the window.
    pub recent_activity: usize,
    /// Assigned tasks that are in progress or in review.
    pub tasks: Vec<StandupAgentTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandupAgentTask {
    pub title: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    pub id: Uuid,
    pub title: String,
    pub completed_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTask {
    pub id: Uuid,
    pub title: String,
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTask {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandupActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub message: String,
    pub agent: String,
    pub task: Option<String>,
    pub time: DateTime<Utc>,
}
