//! One-shot watering reminders on the tokio timer.
//!
//! Each registration is a task sleeping until its due time. Registrations
//! are keyed by plant id; scheduling the same plant again aborts the old
//! task, and a generation check stops a superseded task that already woke
//! from firing. Nothing is retried: if the handler is not reached (shutdown,
//! runtime gone) the reminder is lost.
//!
//! Deadlines are wall-clock times. Tokio timers stop while the host is
//! suspended, so a task never sleeps longer than `MAX_SLEEP` before checking
//! the clock again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::receiver::ReminderHandler;

/// Longest uninterrupted sleep before the wall clock is re-read.
const MAX_SLEEP: Duration = Duration::from_secs(60);

/// What a fired registration delivers to its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub plant_id: i64,
    pub plant_name: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("No async runtime available for reminder scheduling")]
    NoRuntime,
}

/// Registers watering wake-ups.
pub trait ReminderScheduler: Send + Sync {
    /// Fire a reminder for `plant_id` at `at`, replacing any pending one for
    /// the same plant. Times in the past fire immediately.
    fn schedule(&self, plant_id: i64, plant_name: &str, at: DateTime<Utc>);

    /// Drop the pending reminder for `plant_id`, if any.
    fn cancel(&self, plant_id: i64);
}

struct Registration {
    generation: u64,
    at: DateTime<Utc>,
    task: AbortHandle,
}

type Registrations = Arc<Mutex<HashMap<i64, Registration>>>;

/// `ReminderScheduler` backed by tokio timers.
pub struct TokioReminderScheduler {
    runtime: Handle,
    handler: Arc<dyn ReminderHandler>,
    clock: Arc<dyn Clock>,
    registrations: Registrations,
    next_generation: AtomicU64,
    shutdown: CancellationToken,
}

impl TokioReminderScheduler {
    pub fn new(runtime: Handle, handler: Arc<dyn ReminderHandler>) -> Self {
        Self {
            runtime,
            handler,
            clock: Arc::new(SystemClock),
            registrations: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
        }
    }

    /// Measure deadlines against `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build on the runtime the caller is running in.
    ///
    /// # Errors
    /// Returns `ReminderError::NoRuntime` outside a tokio runtime.
    pub fn from_current(handler: Arc<dyn ReminderHandler>) -> Result<Self, ReminderError> {
        let runtime = Handle::try_current().map_err(|_| ReminderError::NoRuntime)?;
        Ok(Self::new(runtime, handler))
    }

    /// Plant ids with a pending reminder, ascending.
    pub fn pending(&self) -> Vec<i64> {
        let mut ids: Vec<_> = self.registrations.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn scheduled_at(&self, plant_id: i64) -> Option<DateTime<Utc>> {
        self.registrations.lock().get(&plant_id).map(|r| r.at)
    }

    pub fn is_scheduled(&self, plant_id: i64) -> bool {
        self.registrations.lock().contains_key(&plant_id)
    }

    /// Drop every pending reminder and refuse new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let drained: Vec<_> = self.registrations.lock().drain().collect();
        for (_, registration) in &drained {
            registration.task.abort();
        }
        tracing::info!("Reminder scheduler stopped ({} pending dropped)", drained.len());
    }
}

impl ReminderScheduler for TokioReminderScheduler {
    fn schedule(&self, plant_id: i64, plant_name: &str, at: DateTime<Utc>) {
        if self.shutdown.is_cancelled() {
            tracing::warn!("Scheduler stopped, not scheduling reminder for plant {}", plant_id);
            return;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let reminder = Reminder {
            plant_id,
            plant_name: plant_name.to_string(),
            at,
        };

        // Spawn under the lock so the task cannot look itself up before it is registered.
        let mut registrations = self.registrations.lock();
        let task = self.runtime.spawn(fire_when_due(
            reminder,
            generation,
            self.registrations.clone(),
            self.handler.clone(),
            self.clock.clone(),
            self.shutdown.child_token(),
        ));

        let registration = Registration {
            generation,
            at,
            task: task.abort_handle(),
        };
        if let Some(previous) = registrations.insert(plant_id, registration) {
            previous.task.abort();
            tracing::debug!("Replaced reminder for plant {} (was {})", plant_id, previous.at);
        }

        tracing::info!("Scheduled watering reminder for plant {} at {}", plant_id, at);
    }

    fn cancel(&self, plant_id: i64) {
        if let Some(registration) = self.registrations.lock().remove(&plant_id) {
            registration.task.abort();
            tracing::info!("Cancelled watering reminder for plant {}", plant_id);
        }
    }
}

impl Drop for TokioReminderScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn fire_when_due(
    reminder: Reminder,
    generation: u64,
    registrations: Registrations,
    handler: Arc<dyn ReminderHandler>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
) {
    loop {
        let remaining = match (reminder.at - clock.now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => remaining,
            // Due, or overdue (negative durations don't convert)
            _ => break,
        };

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(remaining.min(MAX_SLEEP)) => {}
        }
    }

    {
        let mut registrations = registrations.lock();
        match registrations.get(&reminder.plant_id) {
            Some(current) if current.generation == generation => {
                registrations.remove(&reminder.plant_id);
            }
            _ => {
                tracing::trace!("Reminder for plant {} superseded", reminder.plant_id);
                return;
            }
        }
    }

    handler.on_reminder(&reminder);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    struct NoopHandler;

    impl ReminderHandler for NoopHandler {
        fn on_reminder(&self, _reminder: &Reminder) {}
    }

    #[test]
    fn test_from_current_requires_runtime() {
        let result = TokioReminderScheduler::from_current(Arc::new(NoopHandler));
        assert!(matches!(result, Err(ReminderError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_cancel_unknown_is_noop() {
        let scheduler = TokioReminderScheduler::from_current(Arc::new(NoopHandler)).unwrap();
        scheduler.cancel(12345);
        assert!(scheduler.pending().is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_at_tracks_latest() {
        let scheduler = TokioReminderScheduler::from_current(Arc::new(NoopHandler)).unwrap();
        let first = Utc::now() + chrono::Duration::hours(1);
        let second = Utc::now() + chrono::Duration::hours(2);

        scheduler.schedule(1, "Fern", first);
        scheduler.schedule(1, "Fern", second);

        assert_eq!(scheduler.pending(), vec![1]);
        assert_eq!(scheduler.scheduled_at(1), Some(second));
    }
}
