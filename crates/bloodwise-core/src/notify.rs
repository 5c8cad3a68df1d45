//! User notifications
//!
//! The submission boundary reports every outcome as a [`Notification`]
//! through a [`Notifier`]. Hosts decide how to show them.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationLevel {
    /// Operation completed
    Success,
    /// Operation completed with a problem
    Warning,
    /// Operation failed
    Error,
}

/// User-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Text
    pub message: String,
}

impl Notification {
    /// Success notification
    #[inline]
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Warning notification
    #[inline]
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    /// Error notification
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Sink for notifications
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    fn notify(&self, notification: Notification);
}

/// In-memory notifier
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    /// Create empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    /// Number of notifications at a level
    #[must_use]
    pub fn count(&self, level: NotificationLevel) -> usize {
        self.entries.lock().iter().filter(|n| n.level == level).count()
    }

    /// Remove and return all notifications
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries.lock().push(notification);
    }
}

/// Emit a notification as a tracing event, then deliver it
pub(crate) fn emit(notifier: &dyn Notifier, notification: Notification) {
    match notification.level {
        NotificationLevel::Success => tracing::info!(text = %notification.message, "notification"),
        NotificationLevel::Warning => tracing::warn!(text = %notification.message, "notification"),
        NotificationLevel::Error => tracing::error!(text = %notification.message, "notification"),
    }
    notifier.notify(notification);
}
