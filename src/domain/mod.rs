//! Domain layer: core types, pure rules, and the event system.
//!
//! This module contains the server-side domain model: the sequential bin
//! identifier and its renumbering plan, the critical-fill state machine,
//! analytics periods and aggregation, notifications, operator accounts,
//! and the event bus for broadcasting changes.

pub mod analytics;
pub mod dustbin;
pub mod dustbin_event;
pub mod dustbin_id;
pub mod event_bus;
pub mod notification;
pub mod period;
pub mod relative_time;
pub mod renumber;
pub mod user;

pub use dustbin::{CriticalTransition, Dustbin, FillReading, HistorySample};
pub use dustbin_event::{DustbinEvent, Topic};
pub use dustbin_id::DustbinId;
pub use event_bus::EventBus;
pub use notification::{NewNotification, Notification};
pub use period::{AnalyticsPeriod, DateRange};
pub use renumber::{Reassignment, plan_renumbering};
pub use user::{Session, User, UserCredentials};
