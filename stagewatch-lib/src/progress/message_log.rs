use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// How important a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Error,
}

/// A timestamped line of job history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub severity: Severity,
}

/// Bounded history of messages; the oldest entry is evicted once the log is full.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<Message>,
    capacity: usize,
}

impl MessageLog {
    /// Create a log holding at most `capacity` messages (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: Message) {
        if self.entries.len() == self.capacity {
            let _ = self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Copy of the retained messages, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Message> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(text: &str) -> Message {
        Message {
            timestamp: Utc::now(),
            text: text.to_string(),
            severity: Severity::Info,
        }
    }

    #[test]
    fn test_push_below_capacity_keeps_everything() {
        let mut log = MessageLog::new(3);
        log.push(info("a"));
        log.push(info("b"));
        assert_eq!(log.len(), 2);
        let texts: Vec<_> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["a", "b"]);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut log = MessageLog::new(2);
        log.push(info("a"));
        log.push(info("b"));
        log.push(info("c"));
        let texts: Vec<_> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut log = MessageLog::new(0);
        assert_eq!(log.capacity(), 1);
        log.push(info("a"));
        log.push(info("b"));
        assert_eq!(log.to_vec().len(), 1);
        assert_eq!(log.to_vec()[0].text, "b");
    }

    #[test]
    fn test_new_log_is_empty() {
        assert!(MessageLog::new(5).is_empty());
    }
}
