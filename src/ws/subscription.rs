//! Per-connection subscription manager.
//!
//! Tracks which topics a WebSocket client listens to and filters events
//! server-side.

use std::collections::HashSet;

use crate::domain::{DustbinEvent, Topic};

/// Wildcard topic name.
pub const ALL_TOPICS: &str = "*";

/// Topic names accepted and rejected by one subscribe/unsubscribe call.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TopicChange {
    /// Recognised topic names.
    pub accepted: Vec<String>,
    /// Unknown topic names, ignored.
    pub rejected: Vec<String>,
}

/// Topic subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    topics: HashSet<Topic>,
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a manager with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds topics. `"*"` enables the wildcard.
    pub fn subscribe(&mut self, names: &[String]) -> TopicChange {
        let mut change = TopicChange::default();
        for name in names {
            if name == ALL_TOPICS {
                self.subscribe_all = true;
                change.accepted.push(name.clone());
            } else if let Some(topic) = Topic::parse(name) {
                self.topics.insert(topic);
                change.accepted.push(name.clone());
            } else {
                change.rejected.push(name.clone());
            }
        }
        change
    }

    /// Removes topics. `"*"` clears the wildcard and every topic.
    pub fn unsubscribe(&mut self, names: &[String]) -> TopicChange {
        let mut change = TopicChange::default();
        for name in names {
            if name == ALL_TOPICS {
                self.subscribe_all = false;
                self.topics.clear();
                change.accepted.push(name.clone());
            } else if let Some(topic) = Topic::parse(name) {
                self.topics.remove(&topic);
                change.accepted.push(name.clone());
            } else {
                change.rejected.push(name.clone());
            }
        }
        change
    }

    /// Returns `true` if the event should be forwarded to this client.
    #[must_use]
    pub fn matches(&self, event: &DustbinEvent) -> bool {
        self.subscribe_all || self.topics.contains(&event.topic())
    }

    /// Number of explicitly subscribed topics.
    #[must_use]
    pub fn count(&self) -> usize {
        self.topics.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub const fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
