//! Centralized error types for Sprout.
//!
//! Crate-level errors (plant store, weather client, scheduler) are mapped
//! into `AppError` at the state-holder boundary. `user_message()` gives the
//! text shown in a toast or error panel; `Display` keeps the full detail for
//! logs.

use thiserror::Error;

/// Everything a Sprout screen can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network: {0}")]
    Network(#[from] NetworkError),

    #[error("Plant database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather: {0}")]
    Weather(#[from] WeatherError),

    /// Input rejected before reaching the store (e.g. blank plant name).
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Internal failures with no more specific home (lost runtime, crashed worker).
    #[error("Internal: {0}")]
    Service(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short text for the user; never empty.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Validation(_) => "Please check the plant details and try again.",
            AppError::Io(_) => "Sprout couldn't read or write a file.",
            AppError::Service(_) | AppError::Other(_) => "Something went wrong in Sprout.",
        }
    }
}

/// Talking to the weather service failed below the API level.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not connect: {0}")]
    ConnectionFailed(String),

    #[error("timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("unreadable response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "You appear to be offline.",
            NetworkError::Timeout => "The weather service took too long to answer.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Try again later."
            }
            NetworkError::ServerError { .. } => "The weather request was refused.",
            NetworkError::InvalidResponse(_) => "The weather service sent something unexpected.",
        }
    }
}

/// Local plant database failures.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("cannot open: {0}")]
    ConnectionFailed(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt data: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => "Your plant list couldn't be opened.",
            DatabaseError::QueryFailed(_) => "Your plant list couldn't be saved.",
            DatabaseError::NotFound(_) => "That plant no longer exists.",
            DatabaseError::Corruption(_) => "Some saved plant data is damaged.",
        }
    }
}

/// Problems with `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unreadable config file: {0}")]
    Unreadable(String),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Unreadable(_) => "Sprout's settings file couldn't be read.",
            ConfigError::Invalid(_) => "Some of Sprout's settings are invalid.",
        }
    }
}

/// Weather lookup failures the user can act on.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("no such place: {0}")]
    LocationNotFound(String),

    #[error("location permission not granted")]
    PermissionDenied,

    #[error("API key rejected")]
    InvalidApiKey,

    #[error("location unavailable")]
    ServiceUnavailable,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "No place by that name was found.",
            WeatherError::PermissionDenied => "Allow location access to see local weather.",
            WeatherError::InvalidApiKey => "The weather API key was rejected.",
            WeatherError::ServiceUnavailable => "Your location isn't available right now.",
        }
    }
}

/// `reqwest::Error` → `NetworkError`.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        let detail = self.to_string();
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_decode() || self.is_body() {
            return NetworkError::InvalidResponse(detail);
        }
        match self.status() {
            Some(status) => NetworkError::ServerError {
                status: status.as_u16(),
                message: detail,
            },
            None => NetworkError::ConnectionFailed(detail),
        }
    }
}

/// `rusqlite::Error` → `DatabaseError`.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        use rusqlite::ErrorCode;

        let detail = self.to_string();
        match self {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound(detail),
            rusqlite::Error::SqliteFailure(err, _) => match err.code {
                ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                    DatabaseError::Corruption(detail)
                }
                ErrorCode::CannotOpen | ErrorCode::PermissionDenied => {
                    DatabaseError::ConnectionFailed(detail)
                }
                _ => DatabaseError::QueryFailed(detail),
            },
            _ => DatabaseError::QueryFailed(detail),
        }
    }
}
