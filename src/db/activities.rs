use anyhow::{anyhow, Result};
use rusqlite::Connection;

use super::*;

const DEFAULT_LIMIT: u32 = 50;

impl Database {
    // ============================================================
    // Activity operations
    // ============================================================

    pub fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<ActivityWithRelations>> {
        let conn = self.lock()?;
        query_activities(&conn, filter)
    }

    /// Record an activity posted by an external integration.
    pub fn create_activity(&self, input: CreateActivityInput) -> Result<ActivityWithRelations> {
        let conn = self.lock()?;

        let agent = super::agents::get_agent_on(&conn, input.agent_id)?
            .ok_or_else(|| anyhow!("Agent not found: {}", input.agent_id))?;
        let task = match input.task_id {
            Some(task_id) => Some(
                super::tasks::get_task_on(&conn, task_id)?
                    .ok_or_else(|| anyhow!("Task not found: {}", task_id))?,
            ),
            None => None,
        };

        let activity = insert_activity(
            &conn,
            &input.activity_type,
            input.agent_id,
            input.task_id,
            &input.message,
            input.metadata.as_ref(),
        )?;

        Ok(ActivityWithRelations {
            activity,
            agent: AgentRef::from(&agent),
            task: task.map(|t| TaskRef {
                id: t.id,
                title: t.title,
                status: t.status,
            }),
        })
    }
}

/// Feed query, newest first.
pub(super) fn query_activities(conn: &Connection, filter: &ActivityFilter) -> Result<Vec<ActivityWithRelations>> {
    let agents = agents_by_id(conn)?;
    let task_refs = task_refs_by_id(conn)?;

    let mut clauses = Vec::new();
    let mut params: Vec<String> = Vec::new();
    if let Some(task_id) = filter.task_id {
        clauses.push("task_id = ?");
        params.push(task_id.to_string());
    }
    if let Some(agent_id) = filter.agent_id {
        clauses.push("agent_id = ?");
        params.push(agent_id.to_string());
    }
    if let Some(activity_type) = &filter.activity_type {
        clauses.push("type = ?");
        params.push(activity_type.clone());
    }
    if let Some(since) = filter.since {
        clauses.push("created_at >= ?");
        params.push(timestamp(since));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT);

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM activities {} ORDER BY created_at DESC, rowid DESC LIMIT {}",
        ACTIVITY_COLUMNS, where_sql, limit
    ))?;
    let activities = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), activity_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    activities
        .into_iter()
        .map(|activity| {
            let agent = AgentRef::from(lookup(&agents, activity.agent_id, "actor")?);
            let task = activity.task_id.and_then(|id| task_refs.get(&id).cloned());
            Ok(ActivityWithRelations {
                activity,
                agent,
                task,
            })
        })
        .collect()
}
