//! Async plant repository with a live "all plants" query.
//!
//! Every call runs on the blocking pool against a shared `PlantStore`.
//! Successful mutations re-read the table while still holding the store lock
//! and publish the result on a `watch` channel, so observers receive
//! snapshots in the same order the writes were applied.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::plant::Plant;
use crate::plant_store::{PlantStore, PlantStoreError, PlantStoreResult};

/// Immutable list of every stored plant at one point in time.
pub type PlantSnapshot = Arc<Vec<Plant>>;

/// Shared handle to the plant store.
#[derive(Clone)]
pub struct PlantRepository {
    store: Arc<Mutex<PlantStore>>,
    snapshots: Arc<watch::Sender<PlantSnapshot>>,
}

impl PlantRepository {
    /// Wrap an opened store, loading the initial snapshot.
    pub fn new(store: PlantStore) -> PlantStoreResult<Self> {
        let initial = store.list_all()?;
        tracing::debug!("Plant repository ready with {} plants", initial.len());
        let (snapshots, _) = watch::channel(Arc::new(initial));

        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            snapshots: Arc::new(snapshots),
        })
    }

    /// Open the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> PlantStoreResult<Self> {
        Self::new(PlantStore::open(path)?)
    }

    /// Repository over an in-memory database.
    pub fn in_memory() -> PlantStoreResult<Self> {
        Self::new(PlantStore::in_memory()?)
    }

    /// Subscribe to the live list of all plants.
    ///
    /// The receiver starts at the latest snapshot and is notified after
    /// every successful insert, update, delete or watering. Dropping it
    /// unsubscribes.
    pub fn observe_all(&self) -> watch::Receiver<PlantSnapshot> {
        self.snapshots.subscribe()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> PlantSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Read all plants straight from the store.
    pub async fn list_plants(&self) -> PlantStoreResult<Vec<Plant>> {
        self.read(|store| store.list_all()).await
    }

    pub async fn get_plant(&self, id: i64) -> PlantStoreResult<Option<Plant>> {
        self.read(move |store| store.get(id)).await
    }

    /// Persist a plant and return its assigned identifier.
    #[tracing::instrument(skip(self, plant), fields(name = %plant.name))]
    pub async fn insert_plant(&self, plant: &Plant) -> PlantStoreResult<i64> {
        let plant = plant.clone();
        self.write(move |store| store.insert(&plant)).await
    }

    /// # Errors
    /// Returns `PlantStoreError::NotFound` if the plant is not stored.
    #[tracing::instrument(skip(self, plant), fields(plant_id = plant.id))]
    pub async fn update_plant(&self, plant: &Plant) -> PlantStoreResult<()> {
        let plant = plant.clone();
        self.write(move |store| store.update(&plant)).await
    }

    /// # Errors
    /// Returns `PlantStoreError::NotFound` if the plant is not stored.
    #[tracing::instrument(skip(self, plant), fields(plant_id = plant.id))]
    pub async fn delete_plant(&self, plant: &Plant) -> PlantStoreResult<()> {
        let plant = plant.clone();
        self.write(move |store| store.delete(&plant)).await
    }

    /// Record that a plant was watered at `at`.
    pub async fn mark_watered(&self, id: i64, at: DateTime<Utc>) -> PlantStoreResult<Plant> {
        self.write(move |store| store.mark_watered(id, at)).await
    }

    async fn read<T, F>(&self, op: F) -> PlantStoreResult<T>
    where
        F: FnOnce(&PlantStore) -> PlantStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let store = store.lock();
            op(&store)
        })
        .await
        .map_err(|e| PlantStoreError::task(e.to_string()))?
    }

    async fn write<T, F>(&self, op: F) -> PlantStoreResult<T>
    where
        F: FnOnce(&PlantStore) -> PlantStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let snapshots = self.snapshots.clone();
        tokio::task::spawn_blocking(move || {
            let store = store.lock();
            let value = op(&store)?;

            // The write is already durable; a failed re-read only delays observers.
            match store.list_all() {
                Ok(plants) => {
                    snapshots.send_replace(Arc::new(plants));
                }
                Err(e) => tracing::error!("Failed to refresh plant snapshot: {}", e),
            }

            Ok(value)
        })
        .await
        .map_err(|e| PlantStoreError::task(e.to_string()))?
    }
}
