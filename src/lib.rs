//! Mission Control: a task and agent coordination dashboard.
//!
//! Tasks move through a status pipeline, agents comment and @mention each
//! other on task threads, and every write is pushed live to connected
//! dashboards over server-sent events. Mentions are forwarded to the external
//! agent runtime by the [`sweeper`].

pub mod api;
pub mod config;
pub mod db;
pub mod events;
pub mod gateway;
pub mod mentions;
pub mod models;
pub mod sweeper;
