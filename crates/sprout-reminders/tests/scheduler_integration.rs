//! Timer behaviour of TokioReminderScheduler, driven on paused tokio time.
//!
//! The scheduler reads deadlines off a `Clock`; `TestClock` follows tokio's
//! paused time so `advance` moves both, and `jump` moves only the wall clock.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sprout_reminders::{
    Clock, NotificationCenter, Reminder, ReminderHandler, ReminderScheduler,
    TokioReminderScheduler, WateringReminderReceiver,
};
use tokio::time::Instant;

struct TestClock {
    base: DateTime<Utc>,
    started: Instant,
    jumped: Mutex<chrono::Duration>,
}

impl TestClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            base: Utc::now(),
            started: Instant::now(),
            jumped: Mutex::new(chrono::Duration::zero()),
        })
    }

    /// Move the wall clock without letting any tokio time pass.
    fn jump(&self, by: chrono::Duration) {
        let mut jumped = self.jumped.lock();
        *jumped = *jumped + by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed()).unwrap();
        self.base + elapsed + *self.jumped.lock()
    }
}

#[derive(Default)]
struct RecordingHandler {
    fired: Mutex<Vec<Reminder>>,
}

impl RecordingHandler {
    fn fired_names(&self) -> Vec<String> {
        self.fired.lock().iter().map(|r| r.plant_name.clone()).collect()
    }
}

impl ReminderHandler for RecordingHandler {
    fn on_reminder(&self, reminder: &Reminder) {
        self.fired.lock().push(reminder.clone());
    }
}

fn minutes(n: i64) -> chrono::Duration {
    chrono::Duration::minutes(n)
}

async fn advance(mins: u64) {
    tokio::time::sleep(Duration::from_secs(mins * 60)).await;
}

fn scheduler_with(
    handler: Arc<dyn ReminderHandler>,
) -> (TokioReminderScheduler, Arc<TestClock>) {
    let clock = TestClock::new();
    let scheduler = TokioReminderScheduler::from_current(handler)
        .unwrap()
        .with_clock(clock.clone());
    (scheduler, clock)
}

#[tokio::test(start_paused = true)]
async fn test_fires_at_scheduled_time() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(1, "Fern", clock.now() + minutes(30));
    assert!(scheduler.is_scheduled(1));

    advance(29).await;
    assert!(handler.fired_names().is_empty());

    advance(2).await;
    assert_eq!(handler.fired_names(), vec!["Fern"]);
    assert!(scheduler.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_schedule_supersedes_first() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(1, "Fern", clock.now() + minutes(30));
    scheduler.schedule(1, "Boston fern", clock.now() + minutes(60));
    assert_eq!(scheduler.pending(), vec![1]);

    advance(45).await;
    assert!(handler.fired_names().is_empty());

    advance(20).await;
    assert_eq!(handler.fired_names(), vec!["Boston fern"]);
}

#[tokio::test(start_paused = true)]
async fn test_earlier_reschedule_fires_once() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(7, "Ivy", clock.now() + minutes(60));
    scheduler.schedule(7, "Ivy", clock.now() + minutes(10));

    advance(90).await;
    assert_eq!(handler.fired_names(), vec!["Ivy"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_firing() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(2, "Cactus", clock.now() + minutes(5));
    scheduler.cancel(2);
    scheduler.cancel(2);

    advance(10).await;
    assert!(handler.fired_names().is_empty());
    assert!(!scheduler.is_scheduled(2));
}

#[tokio::test(start_paused = true)]
async fn test_past_time_fires_immediately() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(3, "Overdue", clock.now() - minutes(60));
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(handler.fired_names(), vec!["Overdue"]);
}

#[tokio::test(start_paused = true)]
async fn test_plants_are_independent() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(1, "First", clock.now() + minutes(10));
    scheduler.schedule(2, "Second", clock.now() + minutes(20));
    scheduler.cancel(1);

    advance(30).await;
    assert_eq!(handler.fired_names(), vec!["Second"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drops_pending() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(1, "Fern", clock.now() + minutes(5));
    scheduler.shutdown();
    assert!(scheduler.pending().is_empty());

    scheduler.schedule(2, "Ivy", clock.now() + minutes(5));
    assert!(scheduler.pending().is_empty());

    advance(10).await;
    assert!(handler.fired_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fired_reminder_reaches_notification_center() {
    let center = Arc::new(NotificationCenter::default());
    let receiver = Arc::new(WateringReminderReceiver::new(center.clone()));
    let (scheduler, clock) = scheduler_with(receiver);
    let mut posted = center.subscribe();

    scheduler.schedule(11, "Calathea", clock.now() + minutes(15));
    advance(16).await;

    let notification = posted.try_recv().unwrap();
    assert_eq!(notification.slot, 11);
    assert_eq!(notification.body, "It's time to water Calathea");
    assert_eq!(center.active().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wall_clock_jump_past_due_time_fires() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(4, "Monstera", clock.now() + minutes(60));
    advance(1).await;
    assert!(handler.fired_names().is_empty());

    // Host slept through the due time; tokio's timer did not move.
    clock.jump(minutes(120));
    advance(2).await;

    assert_eq!(handler.fired_names(), vec!["Monstera"]);
    assert!(!scheduler.is_scheduled(4));
}

#[tokio::test(start_paused = true)]
async fn test_wall_clock_jump_backwards_delays_firing() {
    let handler = Arc::new(RecordingHandler::default());
    let (scheduler, clock) = scheduler_with(handler.clone());

    scheduler.schedule(5, "Aloe", clock.now() + minutes(10));
    clock.jump(minutes(-30));

    advance(15).await;
    assert!(handler.fired_names().is_empty());

    advance(30).await;
    assert_eq!(handler.fired_names(), vec!["Aloe"]);
}
