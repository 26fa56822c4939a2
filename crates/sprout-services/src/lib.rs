//! Plant persistence for Sprout.
//!
//! `PlantStore` is the synchronous SQLite table; `PlantRepository` is the
//! async face the state holders use, including the live "all plants" query.

pub mod plant;
pub mod plant_repository;
pub mod plant_store;

pub use plant::{validate_name, Plant, PlantEntity, MAX_NAME_LENGTH};
pub use plant_repository::{PlantRepository, PlantSnapshot};
pub use plant_store::{PlantStore, PlantStoreError, PlantStoreResult};
