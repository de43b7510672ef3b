use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::AgentRef;
use super::task::TaskRef;

/// A piece of written output owned by an agent, optionally tied to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub task_id: Option<Uuid>,
    pub agent_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Deliverable,
    Research,
    Protocol,
    Note,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deliverable => "deliverable",
            Self::Research => "research",
            Self::Protocol => "protocol",
            Self::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deliverable" => Some(Self::Deliverable),
            "research" => Some(Self::Research),
            "protocol" => Some(Self::Protocol),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentWithRelations {
    #[serde(flatten)]
    pub document: Document,
    pub agent: AgentRef,
    pub task: Option<TaskRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentInput {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub task_id: Option<Uuid>,
    pub agent_id: Uuid,
}

/// Partial document update. The target id travels in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentInput {
    pub id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<DocumentType>,
}

/// Query parameters for listing documents. Most recently updated first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    pub task_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub doc_type: Option<DocumentType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIdQuery {
    pub id: Option<Uuid>,
}
