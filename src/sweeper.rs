//! Delivery sweeper: forwards pending mention notifications to the agent runtime.
//!
//! Every notification is claimed before it is sent, so overlapping sweeps
//! never forward the same one twice. It leaves the queue whatever the runtime answers.
//! Runtime failures are recorded as [`DeliveryOutcome::Failed`] and never retried.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::db::Database;
use crate::gateway::{AgentNotice, GatewayClient};
use crate::models::{DeliveryOutcome, PendingNotification};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub total: usize,
    /// Notifications taken out of the queue, whether or not the runtime accepted them.
    pub processed: usize,
    /// Local errors only; runtime failures count as processed.
    pub failed: usize,
    /// Claimed by a concurrent sweep or acknowledged before this one reached them.
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Run one sweep over at most `batch_size` pending notifications.
pub async fn process_pending(db: &Database, gateway: &GatewayClient, batch_size: usize) -> Result<SweepReport> {
    let pending = db.pending_notifications(batch_size)?;
    if pending.is_empty() {
        return Ok(SweepReport {
            message: Some("No pending notifications".to_string()),
            ..Default::default()
        });
    }

    let mut report = SweepReport {
        total: pending.len(),
        ..Default::default()
    };

    for item in &pending {
        let id = item.notification.id;
        match db.claim_notification(id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Notification {} already taken, skipping", id);
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to claim notification {}: {:#}", id, e);
                report.failed += 1;
                continue;
            }
        }

        let outcome = match gateway.notify_agent(&item.session_key, &notice_for(item)).await {
            Ok(()) => DeliveryOutcome::Sent,
            Err(e) => {
                tracing::warn!(
                    "Could not reach session {} for @{}: {}",
                    item.session_key,
                    item.agent_name,
                    e
                );
                DeliveryOutcome::Failed
            }
        };

        match db.record_delivery_outcome(id, outcome) {
            Ok(_) => report.processed += 1,
            Err(e) => {
                tracing::error!("Failed to record outcome for notification {}: {:#}", id, e);
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        "Sweep finished: {} total, {} processed, {} failed, {} skipped",
        report.total,
        report.processed,
        report.failed,
        report.skipped
    );
    Ok(report)
}

/// Sweep on a fixed interval until the runtime shuts down.
pub fn spawn_periodic(
    db: Database,
    gateway: GatewayClient,
    batch_size: usize,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = process_pending(&db, &gateway, batch_size).await {
                tracing::error!("Periodic sweep failed: {:#}", e);
            }
        }
    })
}

fn notice_for(item: &PendingNotification) -> AgentNotice {
    AgentNotice::Mention {
        from_agent: item
            .from_agent
            .clone()
            .unwrap_or_else(|| "Someone".to_string()),
        task_title: item.task_title.clone(),
        message: item
            .message_content
            .clone()
            .unwrap_or_else(|| item.notification.content.clone()),
    }
}
