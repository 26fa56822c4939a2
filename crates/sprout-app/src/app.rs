//! Composition root.
//!
//! `AppServices` wires the store, the reminder pipeline (scheduler, receiver,
//! notification center) and the weather client together once at startup and
//! hands shared handles to the view models.

use std::sync::Arc;

use chrono::Utc;
use sprout_core::{AppError, Config};
use sprout_reminders::{
    NotificationCenter, NotificationChannel, ReminderScheduler, TokioReminderScheduler,
    WateringReminderReceiver,
};
use sprout_services::PlantRepository;
use sprout_weather::{Coordinates, FixedLocation, WeatherProvider};

use crate::error_mapping::IntoAppError;
use crate::plants::PlantsViewModel;
use crate::weather::WeatherViewModel;

pub struct AppServices {
    repository: PlantRepository,
    notifications: Arc<NotificationCenter>,
    scheduler: Arc<TokioReminderScheduler>,
    location: FixedLocation,
    plants: PlantsViewModel,
    weather: WeatherViewModel,
}

impl AppServices {
    /// Open the database named by `config` and build everything on top of it.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Fails when the database cannot be opened, there is no runtime, or the
    /// HTTP client cannot be built.
    pub fn build(config: &Config) -> Result<Self, AppError> {
        let path = config.database_path();
        tracing::info!("Opening plant database at {}", path.display());
        let repository = PlantRepository::open(&path).map_err(IntoAppError::into_app_error)?;
        Self::with_repository(config, repository)
    }

    /// Build around an already opened repository.
    ///
    /// # Errors
    /// See [`AppServices::build`].
    pub fn with_repository(config: &Config, repository: PlantRepository) -> Result<Self, AppError> {
        let channel = NotificationChannel::new(
            config.reminders.channel_name.as_str(),
            config.reminders.channel_description.as_str(),
        );
        let notifications = Arc::new(
            NotificationCenter::new(channel).with_permission(config.reminders.notifications_enabled),
        );

        let receiver = Arc::new(WateringReminderReceiver::new(notifications.clone()));
        let scheduler = Arc::new(
            TokioReminderScheduler::from_current(receiver).map_err(IntoAppError::into_app_error)?,
        );

        let provider = WeatherProvider::with_base_url(
            config.weather.effective_api_key(),
            config.weather.base_url.as_str(),
        )
        .map_err(IntoAppError::into_app_error)?
        .with_air_quality(config.weather.air_quality);

        let home = config
            .weather
            .home
            .and_then(|home| Coordinates::new(home.latitude, home.longitude).ok());
        let location = FixedLocation::new(home, config.weather.location_enabled);

        let plants = PlantsViewModel::new(
            repository.clone(),
            scheduler.clone() as Arc<dyn ReminderScheduler>,
        )?;
        let weather = WeatherViewModel::new(Arc::new(provider));

        tracing::info!("Application services ready");

        Ok(Self {
            repository,
            notifications,
            scheduler,
            location,
            plants,
            weather,
        })
    }

    /// Register reminders for every stored plant whose watering time is
    /// still ahead. Timer registrations live only in this process, so this
    /// runs at every startup. Returns how many were registered.
    ///
    /// # Errors
    /// Fails when the plant table cannot be read.
    pub async fn reschedule_pending(&self) -> Result<usize, AppError> {
        let plants = self
            .repository
            .list_plants()
            .await
            .map_err(IntoAppError::into_app_error)?;

        let now = Utc::now();
        let mut count = 0;
        for plant in plants.iter().filter(|p| p.is_due_after(now)) {
            self.scheduler
                .schedule(plant.id, &plant.name, plant.watering_schedule);
            count += 1;
        }

        tracing::info!("Rescheduled {} of {} plant reminders", count, plants.len());
        Ok(count)
    }

    pub fn repository(&self) -> &PlantRepository {
        &self.repository
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn scheduler(&self) -> &Arc<TokioReminderScheduler> {
        &self.scheduler
    }

    pub fn location(&self) -> &FixedLocation {
        &self.location
    }

    pub fn plants(&self) -> &PlantsViewModel {
        &self.plants
    }

    pub fn weather(&self) -> &WeatherViewModel {
        &self.weather
    }

    /// Stop the view models and drop every pending reminder.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down application services");
        self.plants.close();
        self.scheduler.shutdown();
    }
}
