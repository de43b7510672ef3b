//! SQLite-backed store.
//!
//! A single connection sits behind a mutex. Each public operation locks it
//! once; operations with several writes run them inside one transaction so a
//! failing step rolls back everything before it.

mod activities;
mod agents;
mod documents;
mod messages;
mod notifications;
mod schema;
mod seed;
mod standup;
mod tasks;

pub use messages::PostedMessage;
pub use notifications::NotificationDelivery;
pub use seed::{SeedSummary, COORDINATOR_NAME};
pub use tasks::TaskUpdate;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "mission-control")
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("mission-control.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))
    }
}

// ============================================================
// Column lists and row mapping
// ============================================================

const AGENT_COLUMNS: &str = "id, name, display_name, role, session_key, status, current_task_id, last_heartbeat, created_at, updated_at";

const TASK_COLUMNS: &str = "id, title, description, status, priority, created_by_id, current_agent_id, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, task_id, agent_id, content, mentions, created_at";

const ACTIVITY_COLUMNS: &str = "id, type, agent_id, task_id, message, metadata, created_at";

const DOCUMENT_COLUMNS: &str = "id, title, content, type, task_id, agent_id, created_at, updated_at";

const NOTIFICATION_COLUMNS: &str = "id, agent_id, message_id, content, delivered, delivered_at, delivery_outcome, created_at";

fn agent_from_row(row: &Row) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        display_name: row.get(2)?,
        role: row.get(3)?,
        session_key: row.get(4)?,
        status: AgentStatus::from_str(&row.get::<_, String>(5)?).unwrap_or_default(),
        current_task_id: row.get::<_, Option<String>>(6)?.map(parse_uuid),
        last_heartbeat: row.get::<_, Option<String>>(7)?.map(parse_datetime),
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        status: TaskStatus::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        priority: TaskPriority::from_str(&row.get::<_, String>(4)?).unwrap_or_default(),
        created_by_id: parse_uuid(row.get::<_, String>(5)?),
        current_agent_id: row.get::<_, Option<String>>(6)?.map(parse_uuid),
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: parse_uuid(row.get::<_, String>(0)?),
        task_id: parse_uuid(row.get::<_, String>(1)?),
        agent_id: parse_uuid(row.get::<_, String>(2)?),
        content: row.get(3)?,
        mentions: row
            .get::<_, Option<String>>(4)?
            .and_then(|json| serde_json::from_str(&json).ok()),
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: parse_uuid(row.get::<_, String>(0)?),
        activity_type: row.get(1)?,
        agent_id: parse_uuid(row.get::<_, String>(2)?),
        task_id: row.get::<_, Option<String>>(3)?.map(parse_uuid),
        message: row.get(4)?,
        metadata: row
            .get::<_, Option<String>>(5)?
            .and_then(|json| serde_json::from_str(&json).ok()),
        created_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn document_from_row(row: &Row) -> rusqlite::Result<Document> {
    Ok(Document {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        content: row.get(2)?,
        doc_type: DocumentType::from_str(&row.get::<_, String>(3)?)
            .unwrap_or(DocumentType::Note),
        task_id: row.get::<_, Option<String>>(4)?.map(parse_uuid),
        agent_id: parse_uuid(row.get::<_, String>(5)?),
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: parse_uuid(row.get::<_, String>(0)?),
        agent_id: parse_uuid(row.get::<_, String>(1)?),
        message_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
        content: row.get(3)?,
        delivered: row.get::<_, i32>(4)? != 0,
        delivered_at: row.get::<_, Option<String>>(5)?.map(parse_datetime),
        delivery_outcome: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| DeliveryOutcome::from_str(&s)),
        created_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

// ============================================================
// Relation loading
// ============================================================

fn agents_by_id(conn: &Connection) -> Result<HashMap<Uuid, Agent>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM agents", AGENT_COLUMNS))?;
    let agents = stmt
        .query_map([], agent_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(agents.into_iter().map(|a| (a.id, a)).collect())
}

fn task_refs_by_id(conn: &Connection) -> Result<HashMap<Uuid, TaskRef>> {
    let mut stmt = conn.prepare("SELECT id, title, status FROM tasks")?;
    let refs = stmt
        .query_map([], |row| {
            Ok(TaskRef {
                id: parse_uuid(row.get::<_, String>(0)?),
                title: row.get(1)?,
                status: TaskStatus::from_str(&row.get::<_, String>(2)?).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(refs.into_iter().map(|t| (t.id, t)).collect())
}

fn lookup<'a, T>(map: &'a HashMap<Uuid, T>, id: Uuid, what: &str) -> Result<&'a T> {
    map.get(&id)
        .ok_or_else(|| anyhow!("dangling {} reference: {}", what, id))
}

fn insert_activity(
    conn: &Connection,
    activity_type: &str,
    agent_id: Uuid,
    task_id: Option<Uuid>,
    message: &str,
    metadata: Option<&serde_json::Value>,
) -> Result<Activity> {
    let id = Uuid::new_v4();
    let created_at = now();
    let metadata_json = metadata.map(serde_json::to_string).transpose()?;

    conn.execute(
        "INSERT INTO activities (id, type, agent_id, task_id, message, metadata, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            activity_type,
            agent_id.to_string(),
            task_id.map(|u| u.to_string()),
            message,
            &metadata_json,
            timestamp(created_at),
        ),
    )?;

    Ok(Activity {
        id,
        activity_type: activity_type.to_string(),
        agent_id,
        task_id,
        message: message.to_string(),
        metadata: metadata.cloned(),
        created_at,
    })
}

// ============================================================
// Value helpers
// ============================================================

/// Current time at the precision stored in the database.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Placeholder list `?, ?, ?` for an `IN (...)` clause.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
