use anyhow::{anyhow, Result};
use uuid::Uuid;

use super::*;

/// Handle of the agent that owns tasks created without an explicit creator.
pub const COORDINATOR_NAME: &str = "clawdbot";

/// (name, display name, role, session key)
const DEFAULT_ROSTER: &[(&str, &str, &str, &str)] = &[
    (COORDINATOR_NAME, "Clawdbot", "Coordinator", "agent:main:main"),
    ("friday", "Friday", "Backend Developer", "agent:backend:main"),
    ("pixel", "Pixel", "Frontend Developer", "agent:frontend:main"),
    ("fury", "Fury", "Researcher", "agent:research:main"),
];

const WELCOME_TITLE: &str = "Welcome to Mission Control";
const WELCOME_DESCRIPTION: &str =
    "Agents pick up work from the inbox. Mention a teammate with @name to pull them into a thread.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub agents: usize,
    /// Set when the board was empty and the welcome task was created.
    pub welcome_task: Option<Uuid>,
}

impl Database {
    /// Upsert the default roster and add a welcome task to an empty board.
    ///
    /// Safe to run repeatedly: existing agents keep their id and status.
    pub fn seed_agents(&self) -> Result<SeedSummary> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for (name, display_name, role, session_key) in DEFAULT_ROSTER {
            let stamp = timestamp(now());
            tx.execute(
                "INSERT INTO agents (id, name, display_name, role, session_key, status, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, 'idle', ?, ?)
                 ON CONFLICT (name) DO UPDATE SET
                    display_name = excluded.display_name,
                    role = excluded.role,
                    session_key = excluded.session_key,
                    updated_at = excluded.updated_at",
                (
                    Uuid::new_v4().to_string(),
                    name,
                    display_name,
                    role,
                    session_key,
                    &stamp,
                    &stamp,
                ),
            )?;
        }

        let task_count: i64 = tx.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        let welcome_task = if task_count == 0 {
            let coordinator: String = tx
                .query_row(
                    "SELECT id FROM agents WHERE name = ?",
                    [COORDINATOR_NAME],
                    |row| row.get(0),
                )
                .map_err(|e| anyhow!("coordinator missing after seeding: {}", e))?;
            let coordinator = parse_uuid(coordinator);

            let id = Uuid::new_v4();
            let stamp = timestamp(now());
            tx.execute(
                "INSERT INTO tasks (id, title, description, status, priority, created_by_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    id.to_string(),
                    WELCOME_TITLE,
                    WELCOME_DESCRIPTION,
                    TaskStatus::Inbox.as_str(),
                    TaskPriority::Medium.as_str(),
                    coordinator.to_string(),
                    &stamp,
                    &stamp,
                ),
            )?;
            insert_activity(
                &tx,
                kind::TASK_CREATED,
                coordinator,
                Some(id),
                &format!("Task \"{}\" created", WELCOME_TITLE),
                None,
            )?;
            Some(id)
        } else {
            None
        };

        tx.commit()?;

        tracing::info!("Seeded {} agents", DEFAULT_ROSTER.len());
        Ok(SeedSummary {
            agents: DEFAULT_ROSTER.len(),
            welcome_task,
        })
    }

    /// True when no agent exists yet.
    pub fn is_empty(&self) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM agents", [], |row| row.get(0))?;
        Ok(count == 0)
    }
}
