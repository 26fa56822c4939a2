//! SQLite-backed plant storage.
//!
//! One `plants` table, timestamps stored as Unix milliseconds. All methods
//! are synchronous; `PlantRepository` moves them off the async runtime.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

use crate::plant::{Plant, PlantEntity};

const SCHEMA_VERSION: i32 = 1;

const SELECT_COLUMNS: &str = "SELECT id, name, watering_schedule, notes, last_watered FROM plants";

/// Errors that can occur during plant storage operations.
#[derive(Debug, Error)]
pub enum PlantStoreError {
    /// No plant with this identifier exists.
    #[error("Plant not found: {0}")]
    NotFound(i64),

    /// Input rejected before it reached the database.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored timestamp cannot be represented.
    #[error("Invalid {field} timestamp in storage: {value}")]
    InvalidTimestamp { field: &'static str, value: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The blocking worker running the query failed.
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl PlantStoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }
}

/// Result type for plant storage operations.
pub type PlantStoreResult<T> = Result<T, PlantStoreError>;

/// Local SQLite storage for plant records.
pub struct PlantStore {
    conn: Connection,
}

impl PlantStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> PlantStoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PlantStoreError::task(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!("Opened plant database at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> PlantStoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> PlantStoreResult<()> {
        self.conn
            .execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)", [])?;

        let version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS plants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                watering_schedule INTEGER NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                last_watered INTEGER NULL
            );

            CREATE INDEX IF NOT EXISTS idx_plants_schedule ON plants(watering_schedule);
            "#,
        )?;

        if version < SCHEMA_VERSION {
            self.conn.execute("DELETE FROM schema_version", [])?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
            tracing::info!("Plant schema at version {}", SCHEMA_VERSION);
        }

        Ok(())
    }

    fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<PlantEntity> {
        Ok(PlantEntity {
            id: row.get(0)?,
            name: row.get(1)?,
            watering_schedule: row.get(2)?,
            notes: row.get(3)?,
            last_watered: row.get(4)?,
        })
    }

    /// All plants, oldest first.
    pub fn list_all(&self) -> PlantStoreResult<Vec<Plant>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))?;
        let entities = stmt
            .query_map([], Self::row_to_entity)?
            .collect::<Result<Vec<_>, _>>()?;

        entities.into_iter().map(Plant::try_from).collect()
    }

    /// Get a plant by ID. Returns `None` if it doesn't exist.
    pub fn get(&self, id: i64) -> PlantStoreResult<Option<Plant>> {
        let entity = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_entity,
            )
            .optional()?;

        entity.map(Plant::try_from).transpose()
    }

    /// Persist a plant and return its identifier.
    ///
    /// An unsaved plant (`id == 0`) gets a fresh identifier. A plant that
    /// already carries an identifier replaces whatever row has that id.
    pub fn insert(&self, plant: &Plant) -> PlantStoreResult<i64> {
        let entity = plant.to_entity();

        if entity.id == 0 {
            self.conn.execute(
                "INSERT INTO plants (name, watering_schedule, notes, last_watered)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    entity.name,
                    entity.watering_schedule,
                    entity.notes,
                    entity.last_watered
                ],
            )?;
        } else {
            self.conn.execute(
                "INSERT OR REPLACE INTO plants (id, name, watering_schedule, notes, last_watered)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entity.id,
                    entity.name,
                    entity.watering_schedule,
                    entity.notes,
                    entity.last_watered
                ],
            )?;
        }

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Inserted plant {} ({})", id, entity.name);
        Ok(id)
    }

    /// Replace the stored plant with the same identifier.
    ///
    /// # Errors
    /// Returns `PlantStoreError::NotFound` if no such plant exists.
    pub fn update(&self, plant: &Plant) -> PlantStoreResult<()> {
        let entity = plant.to_entity();

        let changed = self.conn.execute(
            "UPDATE plants
             SET name = ?1, watering_schedule = ?2, notes = ?3, last_watered = ?4
             WHERE id = ?5",
            params![
                entity.name,
                entity.watering_schedule,
                entity.notes,
                entity.last_watered,
                entity.id
            ],
        )?;

        if changed == 0 {
            return Err(PlantStoreError::NotFound(entity.id));
        }

        tracing::debug!("Updated plant {}", entity.id);
        Ok(())
    }

    /// Remove the stored plant with the same identifier.
    ///
    /// # Errors
    /// Returns `PlantStoreError::NotFound` if no such plant exists.
    pub fn delete(&self, plant: &Plant) -> PlantStoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM plants WHERE id = ?1", params![plant.id])?;

        if changed == 0 {
            return Err(PlantStoreError::NotFound(plant.id));
        }

        tracing::debug!("Deleted plant {}", plant.id);
        Ok(())
    }

    /// Record a watering and return the updated plant.
    pub fn mark_watered(&self, id: i64, at: DateTime<Utc>) -> PlantStoreResult<Plant> {
        let changed = self.conn.execute(
            "UPDATE plants SET last_watered = ?1 WHERE id = ?2",
            params![at.timestamp_millis(), id],
        )?;

        if changed == 0 {
            return Err(PlantStoreError::NotFound(id));
        }

        self.get(id)?.ok_or(PlantStoreError::NotFound(id))
    }

    /// Check if a plant exists by ID.
    pub fn exists(&self, id: i64) -> PlantStoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM plants WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of stored plants.
    pub fn count(&self) -> PlantStoreResult<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM plants", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{Duration, TimeZone};

    fn create_test_store() -> PlantStore {
        PlantStore::in_memory().expect("Failed to create in-memory store")
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    #[test]
    fn test_insert_and_get_plant() {
        let store = create_test_store();

        let plant = Plant::new("Monstera", at(1_700_000_000_000)).with_notes("Bright, indirect");
        let id = store.insert(&plant).unwrap();
        assert!(id > 0);

        let retrieved = store.get(id).unwrap().unwrap();
        assert_eq!(retrieved.id, id);
        assert_eq!(retrieved.name, "Monstera");
        assert_eq!(retrieved.notes, "Bright, indirect");
        assert_eq!(retrieved.watering_schedule, plant.watering_schedule);
        assert!(retrieved.last_watered.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let store = create_test_store();

        let a = store.insert(&Plant::new("A", at(1))).unwrap();
        let b = store.insert(&Plant::new("B", at(2))).unwrap();
        let c = store.insert(&Plant::new("C", at(3))).unwrap();
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn test_deleted_id_not_reused() {
        let store = create_test_store();

        let first = store.insert(&Plant::new("A", at(1))).unwrap();
        let plant = store.get(first).unwrap().unwrap();
        store.delete(&plant).unwrap();

        let second = store.insert(&Plant::new("B", at(2))).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_list_all_in_insertion_order() {
        let store = create_test_store();

        store.insert(&Plant::new("Fern", at(3))).unwrap();
        store.insert(&Plant::new("Cactus", at(1))).unwrap();
        store.insert(&Plant::new("Ivy", at(2))).unwrap();

        let names: Vec<_> = store.list_all().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Fern", "Cactus", "Ivy"]);
    }

    #[test]
    fn test_insert_with_id_replaces() {
        let store = create_test_store();

        let id = store.insert(&Plant::new("Old", at(1))).unwrap();
        let mut replacement = Plant::new("New", at(5));
        replacement.id = id;

        assert_eq!(store.insert(&replacement).unwrap(), id);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(id).unwrap().unwrap().name, "New");
    }

    #[test]
    fn test_update_preserves_id() {
        let store = create_test_store();

        let id = store.insert(&Plant::new("Basil", at(1_000))).unwrap();
        let mut plant = store.get(id).unwrap().unwrap();
        plant.name = "Thai basil".into();
        plant.watering_schedule = at(9_000);
        store.update(&plant).unwrap();

        let updated = store.get(id).unwrap().unwrap();
        assert_eq!(updated, plant);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_update_nonexistent() {
        let store = create_test_store();

        let mut ghost = Plant::new("Ghost", at(1));
        ghost.id = 99999;
        assert!(matches!(store.update(&ghost), Err(PlantStoreError::NotFound(99999))));
    }

    #[test]
    fn test_delete_plant() {
        let store = create_test_store();

        let id = store.insert(&Plant::new("Doomed", at(1))).unwrap();
        let plant = store.get(id).unwrap().unwrap();
        store.delete(&plant).unwrap();

        assert!(store.get(id).unwrap().is_none());
        assert!(!store.exists(id).unwrap());
    }

    #[test]
    fn test_delete_nonexistent() {
        let store = create_test_store();

        let mut ghost = Plant::new("Ghost", at(1));
        ghost.id = 42;
        assert!(matches!(store.delete(&ghost), Err(PlantStoreError::NotFound(42))));
    }

    #[test]
    fn test_get_nonexistent() {
        let store = create_test_store();
        assert!(store.get(99999).unwrap().is_none());
    }

    #[test]
    fn test_mark_watered() {
        let store = create_test_store();

        let id = store.insert(&Plant::new("Snake plant", at(10_000))).unwrap();
        let when = at(5_000) + Duration::milliseconds(7);
        let plant = store.mark_watered(id, when).unwrap();

        assert_eq!(plant.last_watered, Some(when));
        assert_eq!(plant.watering_schedule, at(10_000));
    }

    #[test]
    fn test_mark_watered_nonexistent() {
        let store = create_test_store();
        assert!(matches!(
            store.mark_watered(5, at(1)),
            Err(PlantStoreError::NotFound(5))
        ));
    }

    #[test]
    fn test_count() {
        let store = create_test_store();
        assert_eq!(store.count().unwrap(), 0);

        store.insert(&Plant::new("One", at(1))).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        store.insert(&Plant::new("Two", at(2))).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plants.db");

        let id = {
            let store = PlantStore::open(&path).unwrap();
            store.insert(&Plant::new("Persistent", at(123_456))).unwrap()
        };

        let store = PlantStore::open(&path).unwrap();
        let plant = store.get(id).unwrap().unwrap();
        assert_eq!(plant.name, "Persistent");
        assert_eq!(plant.watering_schedule, at(123_456));
    }
}
