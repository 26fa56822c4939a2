//! Current-conditions lookup for Sprout.
//!
//! Queries the WeatherAPI.com `current.json` endpoint by city name or by
//! coordinates and maps the response into a `Weather` summary. Nothing is
//! cached; every lookup is a fresh request.

pub mod location;
pub mod provider;
pub mod types;

pub use location::{FixedLocation, LocationSource};
pub use provider::WeatherProvider;
pub use types::*;
