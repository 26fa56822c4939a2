//! Entry point for fired reminders.

use std::sync::Arc;

use crate::notification::Notifier;
use crate::scheduler::Reminder;

/// Called by a scheduler when a reminder comes due.
pub trait ReminderHandler: Send + Sync {
    fn on_reminder(&self, reminder: &Reminder);
}

/// Turns a fired watering reminder into a notification.
///
/// Reminders for unsaved plants (id <= 0) or without a name are ignored.
pub struct WateringReminderReceiver {
    notifier: Arc<dyn Notifier>,
}

impl WateringReminderReceiver {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl ReminderHandler for WateringReminderReceiver {
    fn on_reminder(&self, reminder: &Reminder) {
        if reminder.plant_id <= 0 {
            tracing::warn!("Ignoring reminder with invalid plant id {}", reminder.plant_id);
            return;
        }
        if reminder.plant_name.trim().is_empty() {
            tracing::warn!("Ignoring reminder for plant {} without a name", reminder.plant_id);
            return;
        }

        tracing::debug!(
            "Reminder due for plant {} (scheduled {})",
            reminder.plant_id,
            reminder.at
        );
        self.notifier.notify(reminder.plant_id, &reminder.plant_name);
    }
}
