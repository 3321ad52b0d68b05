use std::collections::HashMap;
use std::sync::Mutex;

use super::{StoreError, TopologyStore};
use crate::exercise::ProgressTracker;
use crate::topology::Topology;

/// In-process store for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    topologies: Mutex<HashMap<(String, String), Topology>>,
    progress: Mutex<HashMap<String, ProgressTracker>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TopologyStore for MemoryStore {
    fn load_topology(&self, user_id: &str, exercise_id: &str) -> Result<Option<Topology>, StoreError> {
        let topologies = self.topologies.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(topologies
            .get(&(user_id.to_string(), exercise_id.to_string()))
            .cloned())
    }

    fn save_topology(&self, user_id: &str, exercise_id: &str, topology: &Topology) -> Result<(), StoreError> {
        let mut topologies = self.topologies.lock().map_err(|_| StoreError::Poisoned)?;
        topologies.insert(
            (user_id.to_string(), exercise_id.to_string()),
            topology.clone(),
        );
        Ok(())
    }

    fn load_progress(&self, user_id: &str) -> Result<Option<ProgressTracker>, StoreError> {
        let progress = self.progress.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(progress.get(user_id).cloned())
    }

    fn save_progress(&self, user_id: &str, tracker: &ProgressTracker) -> Result<(), StoreError> {
        let mut progress = self.progress.lock().map_err(|_| StoreError::Poisoned)?;
        progress.insert(user_id.to_string(), tracker.clone());
        Ok(())
    }
}
