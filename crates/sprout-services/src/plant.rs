//! Plant domain model and its storage representation.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::plant_store::{PlantStoreError, PlantStoreResult};

/// Maximum plant name length accepted at the input boundary.
pub const MAX_NAME_LENGTH: usize = 100;

/// A houseplant and its watering schedule.
///
/// `id == 0` means the plant has not been persisted yet; the store assigns
/// the real identifier on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub id: i64,
    pub name: String,
    /// When to water next.
    pub watering_schedule: DateTime<Utc>,
    pub notes: String,
    /// Absent until the first watering is acknowledged.
    pub last_watered: Option<DateTime<Utc>>,
}

impl Plant {
    /// Create an unsaved plant. The schedule is truncated to milliseconds,
    /// the resolution the store keeps.
    pub fn new(name: impl Into<String>, watering_schedule: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            watering_schedule: watering_schedule.trunc_subsecs(3),
            notes: String::new(),
            last_watered: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Whether the next watering is still ahead of `now`.
    pub fn is_due_after(&self, now: DateTime<Utc>) -> bool {
        self.watering_schedule > now
    }

    pub fn to_entity(&self) -> PlantEntity {
        PlantEntity::from(self)
    }
}

/// Row shape of the `plants` table: timestamps as Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantEntity {
    pub id: i64,
    pub name: String,
    pub watering_schedule: i64,
    pub notes: String,
    pub last_watered: Option<i64>,
}

impl From<&Plant> for PlantEntity {
    fn from(plant: &Plant) -> Self {
        Self {
            id: plant.id,
            name: plant.name.clone(),
            watering_schedule: plant.watering_schedule.timestamp_millis(),
            notes: plant.notes.clone(),
            last_watered: plant.last_watered.map(|dt| dt.timestamp_millis()),
        }
    }
}

impl TryFrom<PlantEntity> for Plant {
    type Error = PlantStoreError;

    fn try_from(entity: PlantEntity) -> Result<Self, Self::Error> {
        let watering_schedule = millis_to_datetime("watering_schedule", entity.watering_schedule)?;
        let last_watered = entity
            .last_watered
            .map(|ms| millis_to_datetime("last_watered", ms))
            .transpose()?;

        Ok(Plant {
            id: entity.id,
            name: entity.name,
            watering_schedule,
            notes: entity.notes,
            last_watered,
        })
    }
}

fn millis_to_datetime(field: &'static str, millis: i64) -> PlantStoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or(PlantStoreError::InvalidTimestamp { field, value: millis })
}

/// Validate a plant name entered by the user.
///
/// # Errors
/// Returns `PlantStoreError::Validation` if the name is blank or longer than
/// `MAX_NAME_LENGTH` characters.
pub fn validate_name(name: &str) -> PlantStoreResult<()> {
    if name.trim().is_empty() {
        return Err(PlantStoreError::validation("Plant name cannot be empty"));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(PlantStoreError::validation(format!(
            "Plant name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use chrono::TimeZone;

    fn ms(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    #[test]
    fn test_new_plant_is_unsaved() {
        let plant = Plant::new("Monstera", ms(1_700_000_000_123));
        assert_eq!(plant.id, 0);
        assert!(!plant.is_persisted());
        assert!(plant.notes.is_empty());
        assert!(plant.last_watered.is_none());
    }

    #[test]
    fn test_new_truncates_to_millis() {
        let precise = Utc.timestamp_opt(1_700_000_000, 123_456_789).single().unwrap();
        let plant = Plant::new("Fern", precise);
        assert_eq!(plant.watering_schedule.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_entity_round_trip_keeps_millis() {
        let plant = Plant {
            id: 7,
            name: "Pothos".into(),
            watering_schedule: ms(1_717_171_717_171),
            notes: "north window".into(),
            last_watered: Some(ms(1_717_000_000_001)),
        };

        let entity = plant.to_entity();
        assert_eq!(entity.watering_schedule, 1_717_171_717_171);
        assert_eq!(entity.last_watered, Some(1_717_000_000_001));

        let back = Plant::try_from(entity).unwrap();
        assert_eq!(back, plant);
    }

    #[test]
    fn test_entity_out_of_range_timestamp() {
        let entity = PlantEntity {
            id: 1,
            name: "Cactus".into(),
            watering_schedule: i64::MAX,
            notes: String::new(),
            last_watered: None,
        };
        let result = Plant::try_from(entity);
        assert!(matches!(
            result,
            Err(PlantStoreError::InvalidTimestamp {
                field: "watering_schedule",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ficus").is_ok());
        assert!(matches!(validate_name(""), Err(PlantStoreError::Validation(_))));
        assert!(matches!(validate_name("   "), Err(PlantStoreError::Validation(_))));

        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(validate_name(&long), Err(PlantStoreError::Validation(_))));
        assert!(validate_name(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_is_due_after() {
        let plant = Plant::new("Aloe", ms(2_000));
        assert!(plant.is_due_after(ms(1_000)));
        assert!(!plant.is_due_after(ms(2_000)));
    }
}
