use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::*;

impl Database {
    // ============================================================
    // Agent operations
    // ============================================================

    /// All agents ordered by name.
    pub fn get_all_agents(&self) -> Result<Vec<Agent>> {
        let conn = self.lock()?;
        all_agents(&conn)
    }

    /// Roster view: every agent with its current task and activity counts.
    pub fn list_agents(&self) -> Result<Vec<AgentSummary>> {
        let conn = self.lock()?;
        let task_refs = task_refs_by_id(&conn)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {},
                (SELECT COUNT(*) FROM tasks t WHERE t.created_by_id = agents.id),
                (SELECT COUNT(*) FROM task_assignments ta WHERE ta.agent_id = agents.id),
                (SELECT COUNT(*) FROM messages m WHERE m.agent_id = agents.id)
             FROM agents ORDER BY name",
            AGENT_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], |row| {
                let agent = agent_from_row(row)?;
                let counts = AgentCounts {
                    created_tasks: row.get(10)?,
                    assignments: row.get(11)?,
                    messages: row.get(12)?,
                };
                Ok((agent, counts))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(agent, counts)| AgentSummary {
                current_task: agent
                    .current_task_id
                    .and_then(|id| task_refs.get(&id).cloned()),
                agent,
                counts,
            })
            .collect())
    }

    pub fn get_agent(&self, id: Uuid) -> Result<Option<Agent>> {
        let conn = self.lock()?;
        get_agent_on(&conn, id)
    }

    /// Look up an agent by its handle, ignoring case.
    pub fn get_agent_by_name(&self, name: &str) -> Result<Option<Agent>> {
        let conn = self.lock()?;
        let agent = conn
            .query_row(
                &format!(
                    "SELECT {} FROM agents WHERE name = ? COLLATE NOCASE",
                    AGENT_COLUMNS
                ),
                [name],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    /// Return the ids from `ids` that do not belong to any agent.
    pub fn find_missing_agents(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let conn = self.lock()?;
        let mut missing = Vec::new();
        for id in ids {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM agents WHERE id = ?)",
                [id.to_string()],
                |row| row.get(0),
            )?;
            if !exists && !missing.contains(id) {
                missing.push(*id);
            }
        }
        Ok(missing)
    }

    /// Register a new agent. Returns `None` if the name is taken, ignoring case.
    pub fn create_agent(&self, input: CreateAgentInput) -> Result<Option<Agent>> {
        let conn = self.lock()?;
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM agents WHERE name = ? COLLATE NOCASE)",
            [&input.name],
            |row| row.get(0),
        )?;
        if taken {
            return Ok(None);
        }

        let id = Uuid::new_v4();
        let created_at = now();
        let status = input.status.unwrap_or_default();

        let inserted = conn.execute(
            "INSERT INTO agents (id, name, display_name, role, session_key, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.display_name,
                &input.role,
                &input.session_key,
                status.as_str(),
                timestamp(created_at),
                timestamp(created_at),
            ),
        );
        match inserted {
            Ok(_) => {}
            // Another connection to the same file won the race.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Some(Agent {
            id,
            name: input.name,
            display_name: input.display_name,
            role: input.role,
            session_key: input.session_key,
            status,
            current_task_id: None,
            last_heartbeat: None,
            created_at,
            updated_at: created_at,
        }))
    }

    /// Apply a status/heartbeat update. Returns `None` if the agent is unknown.
    pub fn update_agent(&self, input: UpdateAgentInput) -> Result<Option<Agent>> {
        let conn = self.lock()?;
        let Some(existing) = get_agent_on(&conn, input.id)? else {
            return Ok(None);
        };

        let updated_at = now();
        let status = input.status.unwrap_or(existing.status);
        let current_task_id = match input.current_task_id {
            Some(value) => value,
            None => existing.current_task_id,
        };
        let last_heartbeat = input.last_heartbeat.or(existing.last_heartbeat);

        conn.execute(
            "UPDATE agents SET status = ?, current_task_id = ?, last_heartbeat = ?, updated_at = ? WHERE id = ?",
            (
                status.as_str(),
                current_task_id.map(|u| u.to_string()),
                last_heartbeat.map(timestamp),
                timestamp(updated_at),
                input.id.to_string(),
            ),
        )?;

        Ok(Some(Agent {
            status,
            current_task_id,
            last_heartbeat,
            updated_at,
            ..existing
        }))
    }
}

pub(super) fn all_agents(conn: &Connection) -> Result<Vec<Agent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM agents ORDER BY name",
        AGENT_COLUMNS
    ))?;
    let agents = stmt
        .query_map([], agent_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(agents)
}

pub(super) fn get_agent_on(conn: &Connection, id: Uuid) -> Result<Option<Agent>> {
    let agent = conn
        .query_row(
            &format!("SELECT {} FROM agents WHERE id = ?", AGENT_COLUMNS),
            [id.to_string()],
            agent_from_row,
        )
        .optional()?;
    Ok(agent)
}
