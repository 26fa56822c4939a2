//! Watering notifications.
//!
//! `NotificationCenter` is the in-process notification tray: it owns the
//! single reminder channel, keeps at most one active notification per plant
//! and broadcasts every posted notification to whatever shell renders them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

/// Identifier of the one reminder channel.
pub const CHANNEL_ID: &str = "plant_watering_reminders";

const TITLE: &str = "Water your plant!";
const BROADCAST_CAPACITY: usize = 32;

/// Something that can put a watering alert in front of the user.
pub trait Notifier: Send + Sync {
    /// Show an alert for `plant_name`. `plant_id` is the alert's slot: a
    /// second alert for the same plant replaces the first.
    fn notify(&self, plant_id: i64, plant_name: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Default,
    High,
}

/// Logical channel notifications are posted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: Importance,
}

impl NotificationChannel {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: CHANNEL_ID.to_string(),
            name: name.into(),
            description: description.into(),
            importance: Importance::High,
        }
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(
            "Plant Watering Reminders",
            "Notifications for plant watering schedules",
        )
    }
}

/// A posted watering alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Slot key; equal to the plant id.
    pub slot: i64,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub posted_at: DateTime<Utc>,
    /// Dismissed when the user opens it.
    pub auto_cancel: bool,
}

impl Notification {
    fn watering(channel: &NotificationChannel, plant_id: i64, plant_name: &str) -> Self {
        Self {
            slot: plant_id,
            channel_id: channel.id.clone(),
            title: TITLE.to_string(),
            body: format!("It's time to water {}", plant_name),
            posted_at: Utc::now(),
            auto_cancel: true,
        }
    }
}

/// In-process notification tray.
pub struct NotificationCenter {
    channel: NotificationChannel,
    permitted: bool,
    active: Mutex<HashMap<i64, Notification>>,
    posted: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new(channel: NotificationChannel) -> Self {
        let (posted, _) = broadcast::channel(BROADCAST_CAPACITY);
        tracing::debug!("Registered notification channel {} ({})", channel.id, channel.name);

        Self {
            channel,
            permitted: true,
            active: Mutex::new(HashMap::new()),
            posted,
        }
    }

    /// Whether the user allowed notifications. When not, `notify` drops
    /// everything.
    pub fn with_permission(mut self, permitted: bool) -> Self {
        self.permitted = permitted;
        self
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    /// Receive every notification posted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.posted.subscribe()
    }

    /// Currently shown notifications, ordered by slot.
    pub fn active(&self) -> Vec<Notification> {
        let mut active: Vec<_> = self.active.lock().values().cloned().collect();
        active.sort_by_key(|n| n.slot);
        active
    }

    /// Remove the notification in `slot`. Returns whether one was shown.
    pub fn dismiss(&self, slot: i64) -> bool {
        self.active.lock().remove(&slot).is_some()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationChannel::default())
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, plant_id: i64, plant_name: &str) {
        if !self.permitted {
            tracing::debug!(
                "Notifications not permitted, dropping reminder for plant {}",
                plant_id
            );
            return;
        }

        let notification = Notification::watering(&self.channel, plant_id, plant_name);
        if self
            .active
            .lock()
            .insert(plant_id, notification.clone())
            .is_some()
        {
            tracing::debug!("Replaced notification in slot {}", plant_id);
        }

        tracing::info!("{}: {}", notification.title, notification.body);

        // Nobody listening is not an error: the notification stays active.
        if self.posted.send(notification).is_err() {
            tracing::trace!("No notification subscribers");
        }
    }
}
