//! Domain models for Mission Control.
//!
//! # Core Concepts
//!
//! ## Durable Entities
//!
//! - [`Agent`]: A named actor executed by the external agent runtime and addressed
//!   through its `session_key`. Agents are seeded, then only their status changes.
//! - [`Task`]: A unit of work moving through the status pipeline
//!   (`inbox → assigned → in_progress → review → done`, plus `blocked`).
//!   Transitions are unconstrained.
//! - [`TaskAssignment`]: Links a task to the agents working on it.
//! - [`Message`]: An immutable comment on a task thread, possibly mentioning agents.
//! - [`Document`]: A deliverable, research note or protocol authored by an agent.
//!
//! ## Bookkeeping Entities
//!
//! - [`Activity`]: Append-only audit log feeding the activity feed and standup.
//! - [`Notification`]: A pending mention for an agent, drained by the sweeper.
//! - [`ThreadSubscription`]: Marks an agent as a participant of a task thread.
//!
//! Wire format is camelCase JSON; enum values are snake_case.

mod activity;
mod agent;
mod document;
mod message;
mod notification;
mod standup;
mod task;

pub use activity::*;
pub use agent::*;
pub use document::*;
pub use message::*;
pub use notification::*;
pub use standup::*;
pub use task::*;

use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` so that a
/// missing key stays `None` while `null` becomes `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
