// Notification log.
// Short-lived success and failure messages shown in the status line.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

/// Notification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn text(&self) -> String {
        if self.message.is_empty() {
            self.title.clone()
        } else {
            format!("{}: {}", self.title, self.message)
        }
    }
}

/// Bounded log of recent notifications, newest last.
#[derive(Debug, Default)]
pub struct Notifications {
    messages: VecDeque<Notification>,
}

impl Notifications {
    const CAPACITY: usize = 50;

    /// How long the latest notification stays in the status line.
    const DISPLAY_FOR: TimeDelta = TimeDelta::seconds(6);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Notification::new(NotificationLevel::Info, title, message));
    }

    pub fn success(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Notification::new(NotificationLevel::Success, title, message));
    }

    pub fn error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(Notification::new(NotificationLevel::Error, title, message));
    }

    fn push(&mut self, notification: Notification) {
        self.messages.push_back(notification);
        while self.messages.len() > Self::CAPACITY {
            self.messages.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.messages.back()
    }

    /// Latest notification if it is still recent enough to display.
    pub fn current(&self, now: DateTime<Utc>) -> Option<&Notification> {
        self.latest()
            .filter(|n| now.signed_duration_since(n.timestamp) < Self::DISPLAY_FOR)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_and_text() {
        let mut notifications = Notifications::new();
        assert!(notifications.latest().is_none());

        notifications.success("Marked as viewed", "PR #12");
        notifications.error("Error fetching pull requests", "");

        let latest = notifications.latest().unwrap();
        assert_eq!(latest.level, NotificationLevel::Error);
        assert_eq!(latest.text(), "Error fetching pull requests");
        assert_eq!(notifications.len(), 2);
    }

    #[test]
    fn test_capacity() {
        let mut notifications = Notifications::new();
        for i in 0..60 {
            notifications.info(format!("n{}", i), "");
        }
        assert_eq!(notifications.len(), Notifications::CAPACITY);
        assert_eq!(notifications.latest().unwrap().title, "n59");
    }

    #[test]
    fn test_current_expires() {
        let mut notifications = Notifications::new();
        notifications.info("hello", "");
        let now = Utc::now();
        assert!(notifications.current(now).is_some());
        assert!(notifications.current(now + TimeDelta::seconds(10)).is_none());
    }
}
