//! WebSocket layer: live fleet and alert events.
//!
//! Clients connect to `/ws`, subscribe to the `dustbins` and/or
//! `notifications` topics (or `*`), and receive every matching
//! [`crate::domain::DustbinEvent`] as it is committed.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
