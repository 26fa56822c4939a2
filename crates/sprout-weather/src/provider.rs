use crate::types::{Coordinates, CurrentResponse, Weather, WeatherError};
use reqwest::Client;
use std::sync::Arc;
use tracing::instrument;

const USER_AGENT: &str = concat!("Sprout/", env!("CARGO_PKG_VERSION"));

/// Client for the `current.json` endpoint.
#[derive(Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    air_quality: bool,
}

impl std::fmt::Debug for WeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherProvider")
            .field("base_url", &self.base_url)
            .field("air_quality", &self.air_quality)
            .finish_non_exhaustive()
    }
}

impl WeatherProvider {
    /// `base_url` is the API root (e.g. `https://api.weatherapi.com/v1`);
    /// `current.json` is appended to it.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            air_quality: false,
        })
    }

    /// Request air-quality data along with current conditions.
    pub fn with_air_quality(mut self, enabled: bool) -> Self {
        self.air_quality = enabled;
        self
    }

    /// Current conditions for a free-text city name.
    #[instrument(skip(self), level = "info")]
    pub async fn by_city(&self, city: &str) -> Result<Weather, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::InvalidQuery("city name is empty".to_string()));
        }
        self.fetch(city).await
    }

    /// Current conditions at a latitude/longitude.
    #[instrument(skip(self), level = "info")]
    pub async fn by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Weather, WeatherError> {
        let coordinates = Coordinates::new(latitude, longitude)?;
        self.fetch(&coordinates.query()).await
    }

    async fn fetch(&self, query: &str) -> Result<Weather, WeatherError> {
        let url = format!("{}/current.json", self.base_url);
        let aqi = if self.air_quality { "yes" } else { "no" };

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", query), ("aqi", aqi)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            tracing::warn!("Weather lookup failed with {}: {}", status, message);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CurrentResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Malformed weather response: {}", e);
            WeatherError::Parse(e.to_string())
        })?;

        let weather = Weather::from(parsed);
        tracing::debug!("Weather for {}: {} {}", weather.location, weather.temperature, weather.condition);
        Ok(weather)
    }
}

/// Pull `error.message` out of a WeatherAPI error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
