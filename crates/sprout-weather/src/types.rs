use serde::{Deserialize, Serialize};

/// Current conditions for one location, as shown on the weather panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// "<name>, <country>"
    pub location: String,
    /// Degrees Celsius
    pub temperature: f64,
    pub condition: String,
    /// Relative humidity, percent
    pub humidity: u8,
    /// Kilometres per hour
    pub wind_speed: f64,
    pub icon_url: String,
}

impl From<CurrentResponse> for Weather {
    fn from(response: CurrentResponse) -> Self {
        Self {
            location: format!("{}, {}", response.location.name, response.location.country),
            temperature: response.current.temp_c,
            condition: response.current.condition.text,
            humidity: response.current.humidity,
            wind_speed: response.current.wind_kph,
            icon_url: icon_url(&response.current.condition.icon),
        }
    }
}

/// Make the API's protocol-relative icon reference (`//cdn...`) absolute.
pub fn icon_url(icon: &str) -> String {
    if icon.starts_with("//") {
        format!("https:{}", icon)
    } else {
        icon.to_string()
    }
}

/// A point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// # Errors
    /// Returns `WeatherError::InvalidQuery` when either value is out of range
    /// or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::InvalidQuery(format!(
                "latitude {} is outside -90..=90",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidQuery(format!(
                "longitude {} is outside -180..=180",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The API's `q` form: `"lat,lon"`.
    pub fn query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

// Wire format of `current.json` (only the fields we read).

#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub location: ApiLocation,
    pub current: ApiCurrent,
}

#[derive(Debug, Deserialize)]
pub struct ApiLocation {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiCurrent {
    pub temp_c: f64,
    pub condition: ApiCondition,
    pub humidity: u8,
    pub wind_kph: f64,
}

#[derive(Debug, Deserialize)]
pub struct ApiCondition {
    pub text: String,
    pub icon: String,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission not granted")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}
