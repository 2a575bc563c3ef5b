//! Registry of published sensor states.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::sensor::entity::SensorSnapshot;

/// Latest state of every registered sensor, keyed by unique id.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: DashMap<String, SensorSnapshot>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new sensor. Returns false, leaving the registry untouched,
    /// if another sensor already holds the unique id.
    pub fn register(&self, snapshot: SensorSnapshot) -> bool {
        match self.entities.entry(snapshot.unique_id.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    unique_id = %snapshot.unique_id,
                    name = %snapshot.name,
                    "Sensor unique id already registered"
                );
                false
            }
            Entry::Vacant(slot) => {
                tracing::debug!(unique_id = %snapshot.unique_id, "Sensor registered");
                slot.insert(snapshot);
                true
            }
        }
    }

    /// Replace the published state of a registered sensor. Updates for ids
    /// that are not registered (or no longer are) are dropped.
    pub fn update(&self, snapshot: SensorSnapshot) -> bool {
        match self.entities.get_mut(&snapshot.unique_id) {
            Some(mut current) => {
                tracing::debug!(
                    unique_id = %snapshot.unique_id,
                    state = %snapshot.state,
                    available = snapshot.available,
                    "Sensor state written"
                );
                *current = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, unique_id: &str) -> Option<SensorSnapshot> {
        self.entities.remove(unique_id).map(|(_, s)| s)
    }

    pub fn get(&self, unique_id: &str) -> Option<SensorSnapshot> {
        self.entities.get(unique_id).map(|r| r.value().clone())
    }

    /// All sensors, ordered by name.
    pub fn all(&self) -> Vec<SensorSnapshot> {
        let mut all: Vec<_> = self.entities.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
