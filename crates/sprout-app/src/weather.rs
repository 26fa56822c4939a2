//! Weather panel state holder.

use std::sync::Arc;

use sprout_core::AppError;
use sprout_weather::{LocationSource, Weather, WeatherError, WeatherProvider};
use tokio::sync::watch;

use crate::error_mapping::IntoAppError;

/// Where a lookup stands. A new lookup may start from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherState {
    pub phase: LookupPhase,
    pub is_loading: bool,
    /// Result of the latest lookup; cleared when a new lookup starts.
    pub weather: Option<Weather>,
    /// Set only in `Failure`, never empty.
    pub error: Option<String>,
}

/// Runs weather lookups and publishes their progress.
///
/// Concurrent lookups are not cancelled; whichever response arrives last
/// wins.
pub struct WeatherViewModel {
    provider: Arc<WeatherProvider>,
    state: watch::Sender<WeatherState>,
}

impl WeatherViewModel {
    pub fn new(provider: Arc<WeatherProvider>) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self { provider, state }
    }

    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    /// # Errors
    /// The mapped lookup failure; the same failure is also published as
    /// state.
    pub async fn lookup_city(&self, city: &str) -> Result<Weather, AppError> {
        self.begin();
        let result = self.provider.by_city(city).await;
        self.finish(result)
    }

    /// # Errors
    /// The mapped lookup failure; the same failure is also published as
    /// state.
    pub async fn lookup_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Weather, AppError> {
        self.begin();
        let result = self.provider.by_coordinates(latitude, longitude).await;
        self.finish(result)
    }

    /// Look up weather wherever `source` says the device is.
    ///
    /// # Errors
    /// Location failures (permission, no fix) and lookup failures, mapped and
    /// published as state.
    pub async fn lookup_current_location(
        &self,
        source: &dyn LocationSource,
    ) -> Result<Weather, AppError> {
        self.begin();
        let result = match source.current_location() {
            Ok(coordinates) => {
                self.provider
                    .by_coordinates(coordinates.latitude, coordinates.longitude)
                    .await
            }
            Err(e) => Err(WeatherError::Location(e)),
        };
        self.finish(result)
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.phase = LookupPhase::Loading;
            s.is_loading = true;
            s.weather = None;
            s.error = None;
        });
    }

    fn finish(&self, result: Result<Weather, WeatherError>) -> Result<Weather, AppError> {
        match result {
            Ok(weather) => {
                self.state.send_modify(|s| {
                    s.phase = LookupPhase::Success;
                    s.is_loading = false;
                    s.weather = Some(weather.clone());
                    s.error = None;
                });
                Ok(weather)
            }
            Err(e) => {
                tracing::warn!("Weather lookup failed: {}", e);
                let err = e.into_app_error();
                let message = err.user_message().to_string();
                self.state.send_modify(|s| {
                    s.phase = LookupPhase::Failure;
                    s.is_loading = false;
                    s.weather = None;
                    s.error = Some(message);
                });
                Err(err)
            }
        }
    }
}
