//! In-process event bus feeding the push endpoint.
//!
//! Handlers emit an [`EventPayload`] after their store writes commit; every
//! connected dashboard holds a [`Subscription`] and re-fetches whatever the
//! event touched. Payloads emitted while nobody listens are dropped, and
//! nothing is persisted or shared across processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};

/// Default per-listener buffer before a slow listener starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskAssigned,
    MessageSent,
    ActivityCreated,
    AgentUpdated,
    DocumentCreated,
    DocumentUpdated,
    DocumentDeleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskUpdated => "task_updated",
            Self::TaskDeleted => "task_deleted",
            Self::TaskAssigned => "task_assigned",
            Self::MessageSent => "message_sent",
            Self::ActivityCreated => "activity_created",
            Self::AgentUpdated => "agent_updated",
            Self::DocumentCreated => "document_created",
            Self::DocumentUpdated => "document_updated",
            Self::DocumentDeleted => "document_deleted",
        }
    }
}

/// A frame on the bus: `{type, data, timestamp}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventPayload {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Process-scoped publish/subscribe register.
///
/// Cloning is cheap and every clone shares the same listener set, so one bus
/// is built at startup and handed to the router state.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventPayload>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Serialize `data` and fan it out to every listener registered right now.
    ///
    /// Returns the number of listeners reached. A payload that fails to
    /// serialize is logged and dropped.
    pub fn emit<T: Serialize>(&self, event_type: EventType, data: &T) -> usize {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(event_type = event_type.as_str(), "Failed to serialize event: {}", e);
                return 0;
            }
        };

        let payload = EventPayload {
            event_type,
            data,
            timestamp: Utc::now(),
        };

        match self.tx.send(payload) {
            Ok(listeners) => {
                tracing::debug!(event_type = event_type.as_str(), listeners, "Emitted event");
                listeners
            }
            Err(_) => {
                tracing::debug!(event_type = event_type.as_str(), "No listeners for event");
                0
            }
        }
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe(&self) -> Subscription {
        let subscription = Subscription {
            rx: self.tx.subscribe(),
        };
        tracing::debug!(listeners = self.listener_count(), "Listener attached");
        subscription
    }

    /// Number of live subscriptions. Useful for spotting leaked listeners.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One listener's view of the bus.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<EventPayload>,
}

impl Subscription {
    /// Wait for the next payload.
    ///
    /// `RecvError::Lagged(n)` means this listener fell behind and `n` payloads
    /// were skipped; the subscription is still usable afterwards.
    pub async fn recv(&mut self) -> Result<EventPayload, RecvError> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv) for tests and polling loops.
    pub fn try_recv(&mut self) -> Option<EventPayload> {
        self.rx.try_recv().ok()
    }

    /// Deregister explicitly. Dropping the subscription has the same effect.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!("Listener detached");
    }
}
