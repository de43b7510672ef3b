use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

use super::*;

/// Result of a task update: the refreshed task plus the audit rows it wrote.
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub task: TaskWithRelations,
    /// Present only when the status actually changed.
    pub status_change: Option<Activity>,
    /// One `task_assigned` activity per listed assignee, when assignees were replaced.
    pub assignments: Option<Vec<Activity>>,
}

impl Database {
    // ============================================================
    // Task operations
    // ============================================================

    /// Tasks on the board, newest first.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskWithRelations>> {
        let conn = self.lock()?;
        let agents = agents_by_id(&conn)?;

        let mut clauses = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }
        if let Some(priority) = filter.priority {
            clauses.push("priority = ?");
            params.push(Box::new(priority.as_str().to_string()));
        }
        if let Some(assignee_id) = filter.assignee_id {
            clauses.push("id IN (SELECT task_id FROM task_assignments WHERE agent_id = ?)");
            params.push(Box::new(assignee_id.to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM tasks {} ORDER BY created_at DESC, rowid DESC",
            TASK_COLUMNS, where_sql
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let tasks = stmt
            .query_map(params_ref.as_slice(), task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        tasks
            .into_iter()
            .map(|task| with_relations(&conn, task, &agents))
            .collect()
    }

    pub fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        let conn = self.lock()?;
        get_task_on(&conn, id)
    }

    /// Task with its thread, documents and the 20 latest activities.
    pub fn get_task_detail(&self, id: Uuid) -> Result<Option<TaskDetail>> {
        let conn = self.lock()?;
        let Some(task) = get_task_on(&conn, id)? else {
            return Ok(None);
        };
        let agents = agents_by_id(&conn)?;
        let task = with_relations(&conn, task, &agents)?;

        let messages = super::messages::thread_on(&conn, id, &agents)?;
        let documents = super::documents::query_documents(
            &conn,
            &DocumentFilter {
                task_id: Some(id),
                ..Default::default()
            },
        )?;
        let activities = super::activities::query_activities(
            &conn,
            &ActivityFilter {
                task_id: Some(id),
                limit: Some(20),
                ..Default::default()
            },
        )?;

        Ok(Some(TaskDetail {
            task,
            messages,
            documents,
            activities,
        }))
    }

    /// Create a task in `inbox`, assign the initial agents and log `task_created`.
    ///
    /// `created_by_id` must already be resolved by the caller.
    pub fn create_task(&self, input: CreateTaskInput, created_by_id: Uuid) -> Result<TaskWithRelations> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let id = Uuid::new_v4();
        let created_at = now();
        let priority = input.priority.unwrap_or_default();

        tx.execute(
            "INSERT INTO tasks (id, title, description, status, priority, created_by_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.title,
                &input.description,
                TaskStatus::Inbox.as_str(),
                priority.as_str(),
                created_by_id.to_string(),
                timestamp(created_at),
                timestamp(created_at),
            ),
        )?;

        for agent_id in dedupe(&input.assignee_ids) {
            insert_assignment(&tx, id, agent_id)?;
        }

        insert_activity(
            &tx,
            kind::TASK_CREATED,
            created_by_id,
            Some(id),
            &format!("Task \"{}\" created", input.title),
            None,
        )?;

        let agents = agents_by_id(&tx)?;
        let task = get_task_on(&tx, id)?
            .ok_or_else(|| anyhow::anyhow!("task {} vanished during creation", id))?;
        let task = with_relations(&tx, task, &agents)?;

        tx.commit()?;
        Ok(task)
    }

    /// Update fields, replace assignees and log the audit trail in one transaction.
    ///
    /// Assignee replacement deletes the whole set and recreates it, logging
    /// `task_assigned` for every listed agent, including ones that were
    /// already assigned. Returns `None` if the task is unknown.
    pub fn update_task(&self, id: Uuid, input: UpdateTaskInput) -> Result<Option<TaskUpdate>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let Some(existing) = get_task_on(&tx, id)? else {
            return Ok(None);
        };

        let updated_at = now();
        let title = input.title.unwrap_or_else(|| existing.title.clone());
        let description = match input.description {
            Some(value) => value,
            None => existing.description.clone(),
        };
        let status = input.status.unwrap_or(existing.status);
        let priority = input.priority.unwrap_or(existing.priority);
        let current_agent_id = match input.current_agent_id {
            Some(value) => value,
            None => existing.current_agent_id,
        };

        tx.execute(
            "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, current_agent_id = ?, updated_at = ?
             WHERE id = ?",
            (
                &title,
                &description,
                status.as_str(),
                priority.as_str(),
                current_agent_id.map(|u| u.to_string()),
                timestamp(updated_at),
                id.to_string(),
            ),
        )?;

        let assignments = match input.assignee_ids {
            Some(assignee_ids) => {
                tx.execute(
                    "DELETE FROM task_assignments WHERE task_id = ?",
                    [id.to_string()],
                )?;

                let mut logged = Vec::new();
                for agent_id in dedupe(&assignee_ids) {
                    insert_assignment(&tx, id, agent_id)?;
                    logged.push(insert_activity(
                        &tx,
                        kind::TASK_ASSIGNED,
                        agent_id,
                        Some(id),
                        &format!("Assigned to task: {}", title),
                        None,
                    )?);
                }
                Some(logged)
            }
            None => None,
        };

        let status_change = if status != existing.status {
            Some(insert_activity(
                &tx,
                kind::STATUS_CHANGED,
                existing.created_by_id,
                Some(id),
                &format!(
                    "Status changed from {} to {}",
                    existing.status.as_str(),
                    status.as_str()
                ),
                Some(&json!({
                    "from": existing.status.as_str(),
                    "to": status.as_str(),
                })),
            )?)
        } else {
            None
        };

        let agents = agents_by_id(&tx)?;
        let task = get_task_on(&tx, id)?
            .ok_or_else(|| anyhow::anyhow!("task {} vanished during update", id))?;
        let task = with_relations(&tx, task, &agents)?;

        tx.commit()?;

        Ok(Some(TaskUpdate {
            task,
            status_change,
            assignments,
        }))
    }

    /// Delete a task and everything that cascades from it. Returns the deleted row.
    pub fn delete_task(&self, id: Uuid) -> Result<Option<Task>> {
        let conn = self.lock()?;
        let Some(task) = get_task_on(&conn, id)? else {
            return Ok(None);
        };
        conn.execute("DELETE FROM tasks WHERE id = ?", [id.to_string()])?;
        Ok(Some(task))
    }

    /// Current assignees of a task in assignment order.
    pub fn get_task_assignments(&self, task_id: Uuid) -> Result<Vec<TaskAssignment>> {
        let conn = self.lock()?;
        assignments_on(&conn, task_id)
    }
}

pub(super) fn get_task_on(conn: &Connection, id: Uuid) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS),
            [id.to_string()],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

pub(super) fn all_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks ORDER BY created_at DESC, rowid DESC",
        TASK_COLUMNS
    ))?;
    let tasks = stmt
        .query_map([], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

fn assignments_on(conn: &Connection, task_id: Uuid) -> Result<Vec<TaskAssignment>> {
    let mut stmt = conn.prepare(
        "SELECT id, task_id, agent_id, created_at FROM task_assignments
         WHERE task_id = ? ORDER BY created_at, rowid",
    )?;
    let assignments = stmt
        .query_map([task_id.to_string()], |row| {
            Ok(TaskAssignment {
                id: parse_uuid(row.get::<_, String>(0)?),
                task_id: parse_uuid(row.get::<_, String>(1)?),
                agent_id: parse_uuid(row.get::<_, String>(2)?),
                created_at: parse_datetime(row.get::<_, String>(3)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(assignments)
}

pub(super) fn with_relations(
    conn: &Connection,
    task: Task,
    agents: &HashMap<Uuid, Agent>,
) -> Result<TaskWithRelations> {
    let created_by = lookup(agents, task.created_by_id, "creator")?.clone();
    let current_agent = task
        .current_agent_id
        .and_then(|id| agents.get(&id).cloned());

    let assignments = assignments_on(conn, task.id)?
        .into_iter()
        .map(|assignment| {
            let agent = lookup(agents, assignment.agent_id, "assignee")?.clone();
            Ok(AssignmentWithAgent { assignment, agent })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TaskWithRelations {
        task,
        created_by,
        current_agent,
        assignments,
    })
}

fn insert_assignment(conn: &Connection, task_id: Uuid, agent_id: Uuid) -> Result<()> {
    conn.execute(
        "INSERT INTO task_assignments (id, task_id, agent_id, created_at) VALUES (?, ?, ?, ?)",
        (
            Uuid::new_v4().to_string(),
            task_id.to_string(),
            agent_id.to_string(),
            timestamp(now()),
        ),
    )?;
    Ok(())
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedupe(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}
