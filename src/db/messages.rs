use std::collections::HashMap;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use uuid::Uuid;

use super::*;

/// A freshly posted comment and the bookkeeping rows it produced.
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub message: MessageWithAgent,
    /// One per mentioned agent other than the author.
    pub notifications: Vec<Notification>,
    pub activity: Activity,
}

impl Database {
    // ============================================================
    // Message operations
    // ============================================================

    /// Messages on a task thread, oldest first.
    pub fn get_messages(&self, task_id: Uuid) -> Result<Vec<MessageWithAgent>> {
        let conn = self.lock()?;
        let agents = agents_by_id(&conn)?;
        thread_on(&conn, task_id, &agents)
    }

    /// Post a comment and run the mention bookkeeping in one transaction.
    ///
    /// `mentions` holds already-resolved agent ids. For every distinct
    /// mentioned agent other than the author a notification is queued and the
    /// agent is subscribed to the thread; the author is always subscribed.
    /// Ids that match no agent are skipped. A `message_sent` activity closes
    /// the sequence.
    pub fn create_message(
        &self,
        task_id: Uuid,
        agent_id: Uuid,
        content: &str,
        mentions: &[Uuid],
    ) -> Result<PostedMessage> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let agents = agents_by_id(&tx)?;
        let author = agents
            .get(&agent_id)
            .ok_or_else(|| anyhow!("Agent not found: {}", agent_id))?
            .clone();
        let task = super::tasks::get_task_on(&tx, task_id)?
            .ok_or_else(|| anyhow!("Task not found: {}", task_id))?;

        let mut mentioned = Vec::new();
        for id in mentions {
            if !agents.contains_key(id) {
                tracing::warn!("Ignoring mention of unknown agent {}", id);
                continue;
            }
            if !mentioned.contains(id) {
                mentioned.push(*id);
            }
        }

        let id = Uuid::new_v4();
        let created_at = now();
        let stored_mentions = if mentioned.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&mentioned)?)
        };

        tx.execute(
            "INSERT INTO messages (id, task_id, agent_id, content, mentions, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                task_id.to_string(),
                agent_id.to_string(),
                content,
                &stored_mentions,
                timestamp(created_at),
            ),
        )?;

        let notice = format!("{} mentioned you on \"{}\"", author.display_name, task.title);
        let mut notifications = Vec::new();
        for mentioned_id in mentioned.iter().filter(|m| **m != agent_id) {
            notifications.push(super::notifications::insert_notification(
                &tx,
                *mentioned_id,
                Some(id),
                &notice,
            )?);
            ensure_subscription_on(&tx, task_id, *mentioned_id)?;
        }
        ensure_subscription_on(&tx, task_id, agent_id)?;

        let activity = insert_activity(
            &tx,
            kind::MESSAGE_SENT,
            agent_id,
            Some(task_id),
            &format!("{} commented on \"{}\"", author.display_name, task.title),
            None,
        )?;

        tx.commit()?;

        Ok(PostedMessage {
            message: MessageWithAgent {
                message: Message {
                    id,
                    task_id,
                    agent_id,
                    content: content.to_string(),
                    mentions: (!mentioned.is_empty()).then_some(mentioned),
                    created_at,
                },
                agent: author,
            },
            notifications,
            activity,
        })
    }

    // ============================================================
    // Thread subscription operations
    // ============================================================

    /// Subscribe an agent to a task thread. Existing subscriptions are returned untouched.
    pub fn ensure_thread_subscription(&self, task_id: Uuid, agent_id: Uuid) -> Result<ThreadSubscription> {
        let conn = self.lock()?;
        ensure_subscription_on(&conn, task_id, agent_id)
    }

    pub fn get_thread_subscriptions(&self, task_id: Uuid) -> Result<Vec<ThreadSubscription>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_id, agent_id, created_at FROM thread_subscriptions
             WHERE task_id = ? ORDER BY created_at, rowid",
        )?;
        let subscriptions = stmt
            .query_map([task_id.to_string()], subscription_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subscriptions)
    }
}

pub(super) fn thread_on(
    conn: &Connection,
    task_id: Uuid,
    agents: &HashMap<Uuid, Agent>,
) -> Result<Vec<MessageWithAgent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM messages WHERE task_id = ? ORDER BY created_at, rowid",
        MESSAGE_COLUMNS
    ))?;
    let messages = stmt
        .query_map([task_id.to_string()], message_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    messages
        .into_iter()
        .map(|message| {
            let agent = lookup(agents, message.agent_id, "author")?.clone();
            Ok(MessageWithAgent { message, agent })
        })
        .collect()
}

fn ensure_subscription_on(conn: &Connection, task_id: Uuid, agent_id: Uuid) -> Result<ThreadSubscription> {
    conn.execute(
        "INSERT INTO thread_subscriptions (id, task_id, agent_id, created_at) VALUES (?, ?, ?, ?)
         ON CONFLICT (task_id, agent_id) DO NOTHING",
        (
            Uuid::new_v4().to_string(),
            task_id.to_string(),
            agent_id.to_string(),
            timestamp(now()),
        ),
    )?;

    let subscription = conn.query_row(
        "SELECT id, task_id, agent_id, created_at FROM thread_subscriptions
         WHERE task_id = ? AND agent_id = ?",
        (task_id.to_string(), agent_id.to_string()),
        subscription_from_row,
    )?;
    Ok(subscription)
}

fn subscription_from_row(row: &rusqlite::Row) -> rusqlite::Result<ThreadSubscription> {
    Ok(ThreadSubscription {
        id: parse_uuid(row.get::<_, String>(0)?),
        task_id: parse_uuid(row.get::<_, String>(1)?),
        agent_id: parse_uuid(row.get::<_, String>(2)?),
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}
