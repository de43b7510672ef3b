use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::*;

/// Outcome of moving one notification out of the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationDelivery {
    pub id: Uuid,
    pub outcome: DeliveryOutcome,
    pub delivered_at: DateTime<Utc>,
}

const LIST_LIMIT: u32 = 50;

impl Database {
    // ============================================================
    // Notification operations
    // ============================================================

    /// Newest 50 notifications, optionally for one agent and/or only pending ones.
    pub fn list_notifications(&self, filter: &NotificationFilter) -> Result<Vec<NotificationWithRelations>> {
        let conn = self.lock()?;
        let agents = agents_by_id(&conn)?;
        let task_refs = task_refs_by_id(&conn)?;

        let mut clauses = Vec::new();
        let mut params: Vec<String> = Vec::new();
        if let Some(agent_id) = filter.agent_id {
            clauses.push("agent_id = ?");
            params.push(agent_id.to_string());
        }
        if filter.undelivered {
            clauses.push("delivered = 0");
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notifications {} ORDER BY created_at DESC, rowid DESC LIMIT {}",
            NOTIFICATION_COLUMNS, where_sql, LIST_LIMIT
        ))?;
        let notifications = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), notification_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        notifications
            .into_iter()
            .map(|notification| {
                let agent = AgentRef::from(lookup(&agents, notification.agent_id, "recipient")?);
                let message = match notification.message_id {
                    Some(message_id) => message_on(&conn, message_id)?.and_then(|message| {
                        let task = task_refs.get(&message.task_id)?.clone();
                        Some(NotificationMessage { message, task })
                    }),
                    None => None,
                };
                Ok(NotificationWithRelations {
                    notification,
                    agent,
                    message,
                })
            })
            .collect()
    }

    pub fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
        let conn = self.lock()?;
        let notification = conn
            .query_row(
                &format!("SELECT {} FROM notifications WHERE id = ?", NOTIFICATION_COLUMNS),
                [id.to_string()],
                notification_from_row,
            )
            .optional()?;
        Ok(notification)
    }

    /// Acknowledge pending notifications by id and/or recipient.
    ///
    /// Only undelivered rows are touched; the count of rows changed is returned.
    /// With no selector nothing is updated.
    pub fn mark_delivered(&self, input: &MarkDeliveredInput) -> Result<usize> {
        let conn = self.lock()?;

        let mut clauses = vec!["delivered = 0".to_string()];
        let mut params: Vec<String> = vec![
            timestamp(now()),
            DeliveryOutcome::Acknowledged.as_str().to_string(),
        ];

        match (&input.notification_ids, input.agent_id) {
            (None, None) => return Ok(0),
            (Some(ids), _) if ids.is_empty() => return Ok(0),
            _ => {}
        }

        if let Some(ids) = &input.notification_ids {
            clauses.push(format!("id IN ({})", placeholders(ids.len())));
            params.extend(ids.iter().map(Uuid::to_string));
        }
        if let Some(agent_id) = input.agent_id {
            clauses.push("agent_id = ?".to_string());
            params.push(agent_id.to_string());
        }

        let updated = conn.execute(
            &format!(
                "UPDATE notifications SET delivered = 1, delivered_at = ?, delivery_outcome = ? WHERE {}",
                clauses.join(" AND ")
            ),
            rusqlite::params_from_iter(params.iter()),
        )?;
        Ok(updated)
    }

    /// Oldest undelivered notifications with what the sweeper needs to forward them.
    pub fn pending_notifications(&self, limit: usize) -> Result<Vec<PendingNotification>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT n.id, n.agent_id, n.message_id, n.content, n.delivered, n.delivered_at,
                    n.delivery_outcome, n.created_at,
                    a.name, a.session_key, t.id, t.title, author.display_name, m.content
             FROM notifications n
             JOIN agents a ON a.id = n.agent_id
             LEFT JOIN messages m ON m.id = n.message_id
             LEFT JOIN tasks t ON t.id = m.task_id
             LEFT JOIN agents author ON author.id = m.agent_id
             WHERE n.delivered = 0
             ORDER BY n.created_at, n.rowid
             LIMIT ?",
        )?;

        let pending = stmt
            .query_map([limit as i64], |row| {
                Ok(PendingNotification {
                    notification: notification_from_row(row)?,
                    agent_name: row.get(8)?,
                    session_key: row.get(9)?,
                    task_id: row.get::<_, Option<String>>(10)?.map(parse_uuid),
                    task_title: row.get(11)?,
                    from_agent: row.get(12)?,
                    message_content: row.get(13)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pending)
    }

    /// Take one notification out of the pending queue before it is forwarded.
    ///
    /// Returns `false` if another sweep or an acknowledgement got there first,
    /// in which case the caller must not send it.
    pub fn claim_notification(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE notifications SET delivered = 1, delivered_at = ?
             WHERE id = ? AND delivered = 0",
            (timestamp(now()), id.to_string()),
        )?;
        Ok(updated == 1)
    }

    /// Record how forwarding a claimed notification went.
    ///
    /// Returns `None` if the notification was not claimed or already has an outcome.
    pub fn record_delivery_outcome(
        &self,
        id: Uuid,
        outcome: DeliveryOutcome,
    ) -> Result<Option<NotificationDelivery>> {
        let conn = self.lock()?;
        let delivered_at: Option<String> = conn
            .query_row(
                "UPDATE notifications SET delivery_outcome = ?
                 WHERE id = ? AND delivered = 1 AND delivery_outcome IS NULL
                 RETURNING delivered_at",
                (outcome.as_str(), id.to_string()),
                |row| row.get(0),
            )
            .optional()?;

        let Some(delivered_at) = delivered_at else {
            return Ok(None);
        };
        Ok(Some(NotificationDelivery {
            id,
            outcome,
            delivered_at: parse_datetime(delivered_at),
        }))
    }

    pub fn count_pending_notifications(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE delivered = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

pub(super) fn insert_notification(
    conn: &Connection,
    agent_id: Uuid,
    message_id: Option<Uuid>,
    content: &str,
) -> Result<Notification> {
    let id = Uuid::new_v4();
    let created_at = now();

    conn.execute(
        "INSERT INTO notifications (id, agent_id, message_id, content, delivered, created_at)
         VALUES (?, ?, ?, ?, 0, ?)",
        (
            id.to_string(),
            agent_id.to_string(),
            message_id.map(|u| u.to_string()),
            content,
            timestamp(created_at),
        ),
    )?;

    Ok(Notification {
        id,
        agent_id,
        message_id,
        content: content.to_string(),
        delivered: false,
        delivered_at: None,
        delivery_outcome: None,
        created_at,
    })
}

fn message_on(conn: &Connection, id: Uuid) -> Result<Option<Message>> {
    let message = conn
        .query_row(
            &format!("SELECT {} FROM messages WHERE id = ?", MESSAGE_COLUMNS),
            [id.to_string()],
            message_from_row,
        )
        .optional()?;
    Ok(message)
}
