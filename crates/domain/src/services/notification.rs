//! Reminder delivery.
//!
//! Delivery itself belongs to an external collaborator. This module only
//! defines the seam and a logging implementation for development and tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::reminder::ReminderDispatch;

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was handed off successfully.
    Sent,
    /// Sending failed. Never surfaced to the sender.
    Failed(String),
    /// Nothing to send (no recipients).
    Skipped,
}

/// Outbound port to the notification collaborator.
#[async_trait::async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(&self, dispatch: ReminderDispatch) -> NotificationResult;
}

/// Notifier that logs dispatches instead of delivering them.
#[derive(Debug, Default)]
pub struct LoggingNotifier {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: AtomicUsize,
}

impl LoggingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that fails every send.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            sent: AtomicUsize::new(0),
        }
    }

    /// Number of dispatches accepted so far.
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReminderNotifier for LoggingNotifier {
    async fn notify(&self, dispatch: ReminderDispatch) -> NotificationResult {
        if dispatch.recipients.is_empty() {
            return NotificationResult::Skipped;
        }

        if self.simulate_failure {
            tracing::warn!(
                form_id = %dispatch.form_id,
                group_id = %dispatch.group_id,
                "Logging notifier simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        self.sent.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            form_id = %dispatch.form_id,
            group_id = %dispatch.group_id,
            recipients = dispatch.recipients.len(),
            "Would send reminder notification"
        );
        NotificationResult::Sent
    }
}
