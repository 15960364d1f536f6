//! User notifications.
//!
//! Each capture emits exactly one [`Notification`]. Delivery is
//! fire-and-forget: a notifier cannot fail the capture.

use std::fmt;

use tracing::{error, info};

// ============================================================================
// Notification
// ============================================================================

/// Title used for successful captures.
pub const SUCCESS_TITLE: &str = "PDF saved";

/// Title used for failed captures.
pub const FAILURE_TITLE: &str = "PDF save failed";

/// Outcome a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The PDF was saved.
    Success,
    /// The capture failed.
    Failure,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Success or failure.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Notification {
    /// Creates a success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: SUCCESS_TITLE.to_string(),
            message: message.into(),
        }
    }

    /// Creates a failure notification.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Failure,
            title: FAILURE_TITLE.to_string(),
            message: message.into(),
        }
    }

    /// Returns `true` for success notifications.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == NotificationKind::Success
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Delivers notifications to the user.
pub trait Notifier: Send + Sync {
    /// Shows `notification`. Must not block for long.
    fn notify(&self, notification: &Notification);
}

/// Logs notifications through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Success => {
                info!(title = %notification.title, message = %notification.message, "Notification");
            }
            NotificationKind::Failure => {
                error!(
                    title = %notification.title,
                    message = %notification.message,
                    "Notification"
                );
            }
        }
    }
}

/// Prints notifications to the terminal.
///
/// Success goes to stdout, failure to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) {
        TracingNotifier.notify(notification);

        match notification.kind {
            NotificationKind::Success => println!("{notification}"),
            NotificationKind::Failure => eprintln!("{notification}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_notification() {
        let n = Notification::success("PDF downloaded: a.pdf");
        assert!(n.is_success());
        assert_eq!(n.title, SUCCESS_TITLE);
        assert_eq!(n.to_string(), "PDF saved: PDF downloaded: a.pdf");
    }

    #[test]
    fn test_failure_notification() {
        let n = Notification::failure("No tab with id: 7");
        assert!(!n.is_success());
        assert_eq!(n.kind, NotificationKind::Failure);
        assert_eq!(n.title, FAILURE_TITLE);
    }

    #[test]
    fn test_notifiers_are_object_safe() {
        let notifiers: Vec<Box<dyn Notifier>> =
            vec![Box::new(TracingNotifier), Box::new(ConsoleNotifier)];
        for notifier in &notifiers {
            notifier.notify(&Notification::success("ok"));
        }
    }
}
