use crate::types::{Coordinates, LocationError};

/// Where "my location" comes from.
pub trait LocationSource: Send + Sync {
    fn current_location(&self) -> Result<Coordinates, LocationError>;
}

/// Location taken from configuration rather than a positioning service.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coordinates: Option<Coordinates>,
    permitted: bool,
}

impl FixedLocation {
    pub fn new(coordinates: Option<Coordinates>, permitted: bool) -> Self {
        Self {
            coordinates,
            permitted,
        }
    }
}

impl LocationSource for FixedLocation {
    fn current_location(&self) -> Result<Coordinates, LocationError> {
        if !self.permitted {
            return Err(LocationError::PermissionDenied);
        }
        self.coordinates.ok_or(LocationError::ServiceUnavailable)
    }
}
