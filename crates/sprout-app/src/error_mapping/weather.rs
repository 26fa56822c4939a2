use sprout_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError as CoreWeatherError};
use sprout_weather::{LocationError, WeatherError};

use super::IntoAppError;

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        match self {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Status { status: 401 | 403, .. } => {
                AppError::Weather(CoreWeatherError::InvalidApiKey)
            }
            // WeatherAPI answers 400 for an unknown place
            WeatherError::Status {
                status: 400,
                message,
            } => AppError::Weather(CoreWeatherError::LocationNotFound(message)),
            WeatherError::Status { status, message } => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            WeatherError::Parse(message) => AppError::Network(NetworkError::InvalidResponse(message)),
            WeatherError::InvalidQuery(message) => AppError::Validation(message),
            WeatherError::Location(e) => e.into_app_error(),
        }
    }
}

impl IntoAppError for LocationError {
    fn into_app_error(self) -> AppError {
        match self {
            LocationError::PermissionDenied => AppError::Weather(CoreWeatherError::PermissionDenied),
            LocationError::ServiceUnavailable => {
                AppError::Weather(CoreWeatherError::ServiceUnavailable)
            }
            LocationError::Other(message) => {
                AppError::Weather(CoreWeatherError::LocationNotFound(message))
            }
        }
    }
}
