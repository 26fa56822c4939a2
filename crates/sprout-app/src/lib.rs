//! Sprout application layer: state holders and the composition root.

pub mod app;
pub mod error_mapping;
pub mod plants;
pub mod weather;

pub use app::AppServices;
pub use error_mapping::IntoAppError;
pub use plants::{PlantsEvent, PlantsState, PlantsViewModel};
pub use weather::{LookupPhase, WeatherState, WeatherViewModel};
