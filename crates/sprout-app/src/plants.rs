//! Plant list state holder.
//!
//! `PlantsViewModel` mirrors the repository's live query into a
//! `PlantsState` and turns user intents (`PlantsEvent`) into store writes
//! followed by reminder scheduling. The store write always comes first; if it
//! fails the scheduler is left alone and the error is returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sprout_core::AppError;
use sprout_reminders::ReminderScheduler;
use sprout_services::{validate_name, Plant, PlantRepository, PlantSnapshot};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error_mapping::IntoAppError;

/// What the plant list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantsState {
    pub plants: PlantSnapshot,
    /// True until the first snapshot arrives.
    pub is_loading: bool,
}

impl Default for PlantsState {
    fn default() -> Self {
        Self {
            plants: Arc::new(Vec::new()),
            is_loading: true,
        }
    }
}

/// User intents on the plant list.
#[derive(Debug, Clone)]
pub enum PlantsEvent {
    AddPlant {
        name: String,
        watering_schedule: DateTime<Utc>,
        notes: String,
    },
    UpdatePlant {
        plant: Plant,
        name: String,
        watering_schedule: DateTime<Utc>,
        notes: String,
    },
    DeletePlant {
        plant: Plant,
    },
    MarkWatered {
        plant: Plant,
    },
}

pub struct PlantsViewModel {
    repository: PlantRepository,
    scheduler: Arc<dyn ReminderScheduler>,
    state: Arc<watch::Sender<PlantsState>>,
    cancel: CancellationToken,
}

impl PlantsViewModel {
    /// Create the view model and start following the repository.
    ///
    /// # Errors
    /// Returns `AppError::Service` when called outside a tokio runtime.
    pub fn new(
        repository: PlantRepository,
        scheduler: Arc<dyn ReminderScheduler>,
    ) -> Result<Self, AppError> {
        let runtime = Handle::try_current()
            .map_err(|_| AppError::Service("No async runtime for plant updates".to_string()))?;

        let (state, _) = watch::channel(PlantsState::default());
        let state = Arc::new(state);
        let cancel = CancellationToken::new();

        runtime.spawn(follow_repository(
            repository.observe_all(),
            state.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            repository,
            scheduler,
            state,
            cancel,
        })
    }

    pub fn state(&self) -> PlantsState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes; the receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<PlantsState> {
        self.state.subscribe()
    }

    /// Apply one user intent.
    ///
    /// # Errors
    /// `AppError::Validation` for a blank or over-long name,
    /// `AppError::Database` when the store write fails.
    #[tracing::instrument(skip(self))]
    pub async fn on_event(&self, event: PlantsEvent) -> Result<(), AppError> {
        match event {
            PlantsEvent::AddPlant {
                name,
                watering_schedule,
                notes,
            } => self.add_plant(name, watering_schedule, notes).await,
            PlantsEvent::UpdatePlant {
                plant,
                name,
                watering_schedule,
                notes,
            } => self.update_plant(plant, name, watering_schedule, notes).await,
            PlantsEvent::DeletePlant { plant } => self.delete_plant(plant).await,
            PlantsEvent::MarkWatered { plant } => self.mark_watered(plant).await,
        }
    }

    /// Stop following the repository. State stays at its last value.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    async fn add_plant(
        &self,
        name: String,
        watering_schedule: DateTime<Utc>,
        notes: String,
    ) -> Result<(), AppError> {
        validate_name(&name).map_err(IntoAppError::into_app_error)?;

        let plant = Plant::new(name, watering_schedule).with_notes(notes);
        let id = self
            .repository
            .insert_plant(&plant)
            .await
            .map_err(IntoAppError::into_app_error)?;

        self.scheduler
            .schedule(id, &plant.name, plant.watering_schedule);
        tracing::info!("Added plant {} ({})", id, plant.name);
        Ok(())
    }

    async fn update_plant(
        &self,
        plant: Plant,
        name: String,
        watering_schedule: DateTime<Utc>,
        notes: String,
    ) -> Result<(), AppError> {
        validate_name(&name).map_err(IntoAppError::into_app_error)?;

        let updated = Plant {
            id: plant.id,
            last_watered: plant.last_watered,
            ..Plant::new(name, watering_schedule).with_notes(notes)
        };
        self.repository
            .update_plant(&updated)
            .await
            .map_err(IntoAppError::into_app_error)?;

        self.scheduler.cancel(updated.id);
        self.scheduler
            .schedule(updated.id, &updated.name, updated.watering_schedule);
        Ok(())
    }

    async fn delete_plant(&self, plant: Plant) -> Result<(), AppError> {
        self.repository
            .delete_plant(&plant)
            .await
            .map_err(IntoAppError::into_app_error)?;

        self.scheduler.cancel(plant.id);
        tracing::info!("Deleted plant {}", plant.id);
        Ok(())
    }

    async fn mark_watered(&self, plant: Plant) -> Result<(), AppError> {
        let watered = self
            .repository
            .mark_watered(plant.id, Utc::now())
            .await
            .map_err(IntoAppError::into_app_error)?;

        tracing::debug!("Plant {} watered at {:?}", watered.id, watered.last_watered);
        Ok(())
    }
}

impl Drop for PlantsViewModel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn follow_repository(
    mut snapshots: watch::Receiver<PlantSnapshot>,
    state: Arc<watch::Sender<PlantsState>>,
    cancel: CancellationToken,
) {
    loop {
        let plants = snapshots.borrow_and_update().clone();
        state.send_modify(|s| {
            s.plants = plants;
            s.is_loading = false;
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Stopped following plant repository");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    struct NullScheduler;

    impl ReminderScheduler for NullScheduler {
        fn schedule(&self, _plant_id: i64, _plant_name: &str, _at: DateTime<Utc>) {}
        fn cancel(&self, _plant_id: i64) {}
    }

    #[test]
    fn test_new_requires_runtime() {
        let repository = PlantRepository::in_memory().unwrap();
        let result = PlantsViewModel::new(repository, Arc::new(NullScheduler));
        assert!(matches!(result, Err(AppError::Service(_))));
    }

    #[test]
    fn test_default_state_is_loading() {
        let state = PlantsState::default();
        assert!(state.is_loading);
        assert!(state.plants.is_empty());
    }

    #[tokio::test]
    async fn test_close_stops_following() {
        let repository = PlantRepository::in_memory().unwrap();
        let vm = PlantsViewModel::new(repository.clone(), Arc::new(NullScheduler)).unwrap();
        let mut rx = vm.subscribe();
        rx.wait_for(|s| !s.is_loading).await.unwrap();

        vm.close();
        tokio::task::yield_now().await;

        repository
            .insert_plant(&Plant::new("Fern", Utc::now()))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(vm.state().plants.is_empty());
    }
}
