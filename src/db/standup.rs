use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::*;

const WINDOW_HOURS: i64 = 24;
const RECENT_ACTIVITY_LIMIT: u32 = 20;

impl Database {
    /// Build the daily standup as of `at`, looking back 24 hours.
    pub fn standup(&self, at: DateTime<Utc>) -> Result<StandupReport> {
        let conn = self.lock()?;
        let since = at - Duration::hours(WINDOW_HOURS);

        let agents = super::agents::all_agents(&conn)?;
        let agents_map: HashMap<Uuid, Agent> = agents.iter().map(|a| (a.id, a.clone())).collect();
        let tasks = super::tasks::all_tasks(&conn)?;

        let mut assignees: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT task_id, agent_id FROM task_assignments ORDER BY created_at, rowid",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        parse_uuid(row.get::<_, String>(0)?),
                        parse_uuid(row.get::<_, String>(1)?),
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (task_id, agent_id) in rows {
                assignees.entry(task_id).or_default().push(agent_id);
            }
        }

        let changed_recently: Vec<Uuid> = {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT task_id FROM activities
                 WHERE type = ? AND task_id IS NOT NULL AND created_at >= ?",
            )?;
            let ids = stmt
                .query_map((kind::STATUS_CHANGED, timestamp(since)), |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            ids.into_iter().map(parse_uuid).collect()
        };

        let activity_counts: HashMap<Uuid, usize> = {
            let mut stmt = conn.prepare(
                "SELECT agent_id, COUNT(*) FROM activities WHERE created_at >= ? GROUP BY agent_id",
            )?;
            let rows = stmt
                .query_map([timestamp(since)], |row| {
                    Ok((parse_uuid(row.get::<_, String>(0)?), row.get::<_, i64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(|(id, n)| (id, n as usize)).collect()
        };

        let display_names = |task_id: Uuid| -> Vec<String> {
            assignees
                .get(&task_id)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| agents_map.get(id))
                        .map(|a| a.display_name.clone())
                        .collect()
                })
                .unwrap_or_default()
        };
        let active = |status: TaskStatus| -> Vec<ActiveTask> {
            tasks
                .iter()
                .filter(|t| t.status == status)
                .map(|t| ActiveTask {
                    id: t.id,
                    title: t.title.clone(),
                    assignees: display_names(t.id),
                })
                .collect()
        };

        let completed_tasks: Vec<CompletedTask> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done && changed_recently.contains(&t.id))
            .map(|t| CompletedTask {
                id: t.id,
                title: t.title.clone(),
                completed_by: display_names(t.id).join(", "),
            })
            .collect();
        let in_progress_tasks = active(TaskStatus::InProgress);
        let review_tasks = active(TaskStatus::Review);
        let blocked_tasks: Vec<BlockedTask> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Blocked)
            .map(|t| BlockedTask {
                id: t.id,
                title: t.title.clone(),
                description: t.description.clone(),
            })
            .collect();

        let mut status_counts: BTreeMap<String, usize> = TaskStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for task in &tasks {
            *status_counts.entry(task.status.as_str().to_string()).or_default() += 1;
        }

        let task_by_id: HashMap<Uuid, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
        let standup_agents = agents
            .iter()
            .map(|agent| {
                // Board order, newest task first.
                let agent_tasks = tasks
                    .iter()
                    .filter(|t| matches!(t.status, TaskStatus::InProgress | TaskStatus::Review))
                    .filter(|t| assignees.get(&t.id).is_some_and(|ids| ids.contains(&agent.id)))
                    .map(|t| StandupAgentTask {
                        title: t.title.clone(),
                        status: t.status,
                    })
                    .collect();
                StandupAgent {
                    name: agent.display_name.clone(),
                    role: agent.role.clone(),
                    status: agent.status,
                    current_task: agent
                        .current_task_id
                        .and_then(|id| task_by_id.get(&id))
                        .map(|t| t.title.clone()),
                    recent_activity: activity_counts.get(&agent.id).copied().unwrap_or(0),
                    tasks: agent_tasks,
                }
            })
            .collect();

        let recent_activities = super::activities::query_activities(
            &conn,
            &ActivityFilter {
                limit: Some(RECENT_ACTIVITY_LIMIT),
                since: Some(since),
                ..Default::default()
            },
        )?
        .into_iter()
        .map(|a| StandupActivity {
            activity_type: a.activity.activity_type,
            message: a.activity.message,
            agent: a.agent.display_name,
            task: a.task.map(|t| t.title),
            time: a.activity.created_at,
        })
        .collect();

        Ok(StandupReport {
            generated_at: at,
            date: at.format("%A, %B %-d, %Y").to_string(),
            summary: StandupSummary {
                total_tasks: tasks.len(),
                completed: completed_tasks.len(),
                in_progress: in_progress_tasks.len(),
                in_review: review_tasks.len(),
                blocked: blocked_tasks.len(),
            },
            status_counts,
            agents: standup_agents,
            completed_tasks,
            in_progress_tasks,
            review_tasks,
            blocked_tasks,
            recent_activities,
        })
    }
}
