// Notifications - transient feedback shown to the user

use chrono::{DateTime, Local};
use std::fmt;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// What the notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Checkpoint,
    Seek,
    Completion,
    Playback,
    Config,
}

/// Notification with timestamp and metadata
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl Notification {
    /// Create a notification stamped with the current time
    pub fn new(level: NotificationLevel, category: NotificationCategory, message: String) -> Self {
        Self {
            level,
            category,
            message,
            timestamp: Local::now(),
        }
    }

    pub fn info(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }

    /// Check if the notification is younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: i64) -> bool {
        let age = Local::now().signed_duration_since(self.timestamp);
        age.num_milliseconds() < max_age_ms
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warn",
            NotificationLevel::Error => "error",
        };
        write!(
            f,
            "[{} {}] {}",
            self.timestamp.format("%H:%M:%S"),
            level,
            self.message
        )
    }
}
