//! Newest-first security alert log.

use std::collections::VecDeque;

use crate::message::AlertRecord;

/// Number of alerts kept when no other capacity is configured.
pub const DEFAULT_ALERT_LOG_LEN: usize = 50;

/// Bounded alert list. Index 0 is the most recent alert.
#[derive(Debug, Clone)]
pub struct AlertLog {
    entries: VecDeque<AlertRecord>,
    capacity: usize,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ALERT_LOG_LEN)
    }
}

impl AlertLog {
    /// Creates an empty log. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts `alert` at the head and drops the oldest entries beyond capacity.
    pub fn prepend(&mut self, alert: AlertRecord) {
        self.entries.push_front(alert);
        self.entries.truncate(self.capacity);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alerts, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &AlertRecord> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&AlertRecord> {
        self.entries.front()
    }
}
