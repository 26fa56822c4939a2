//! Watering reminders: timed wake-ups and the notifications they raise.
//!
//! The scheduler fires a `Reminder` at the requested time; the receiver
//! turns it into a notification through a `Notifier`. Both ends are traits so
//! state holders can be exercised against recording fakes.

pub mod clock;
pub mod notification;
pub mod receiver;
pub mod scheduler;

pub use clock::{Clock, SystemClock};
pub use notification::{
    Importance, Notification, NotificationCenter, NotificationChannel, Notifier, CHANNEL_ID,
};
pub use receiver::{ReminderHandler, WateringReminderReceiver};
pub use scheduler::{Reminder, ReminderError, ReminderScheduler, TokioReminderScheduler};
