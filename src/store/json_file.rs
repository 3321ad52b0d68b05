use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::{check_key, StoreError, TopologyStore};
use crate::exercise::ProgressTracker;
use crate::topology::Topology;

/// Pretty-printed JSON files under one root directory.
///
/// Layout: `<root>/topologies/<user>/<exercise>.json` and
/// `<root>/progress/<user>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonFileStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn topology_path(&self, user_id: &str, exercise_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self
            .root
            .join("topologies")
            .join(check_key(user_id)?)
            .join(format!("{}.json", check_key(exercise_id)?)))
    }

    fn progress_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self
            .root
            .join("progress")
            .join(format!("{}.json", check_key(user_id)?)))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    debug!("Wrote {:?}", path);
    Ok(())
}

impl TopologyStore for JsonFileStore {
    fn load_topology(&self, user_id: &str, exercise_id: &str) -> Result<Option<Topology>, StoreError> {
        read_json(&self.topology_path(user_id, exercise_id)?)
    }

    fn save_topology(&self, user_id: &str, exercise_id: &str, topology: &Topology) -> Result<(), StoreError> {
        write_json(&self.topology_path(user_id, exercise_id)?, topology)
    }

    fn load_progress(&self, user_id: &str) -> Result<Option<ProgressTracker>, StoreError> {
        read_json(&self.progress_path(user_id)?)
    }

    fn save_progress(&self, user_id: &str, progress: &ProgressTracker) -> Result<(), StoreError> {
        write_json(&self.progress_path(user_id)?, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{DeviceFactory, DeviceType};
    use tempfile::TempDir;

    fn sample_topology() -> Topology {
        let mut factory = DeviceFactory::seeded(21);
        Topology {
            devices: vec![
                factory.build(DeviceType::Router, 10.0, 20.0),
                factory.build(DeviceType::DhcpServer, 30.0, 40.0),
            ],
            cables: Vec::new(),
        }
    }

    #[test]
    fn test_topology_round_trip_and_layout() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let topology = sample_topology();

        assert!(store.load_topology("bob", "ex1").unwrap().is_none());
        store.save_topology("bob", "ex1", &topology).unwrap();

        let path = dir.path().join("topologies").join("bob").join("ex1.json");
        assert!(path.exists());
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"dhcpConfig\""));
        assert!(raw.contains("\"type\": \"dhcp-server\""));

        assert_eq!(store.load_topology("bob", "ex1").unwrap(), Some(topology));
    }

    #[test]
    fn test_save_is_upsert() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save_topology("bob", "ex1", &sample_topology()).unwrap();
        store.save_topology("bob", "ex1", &Topology::default()).unwrap();
        assert_eq!(store.load_topology("bob", "ex1").unwrap(), Some(Topology::default()));
    }

    #[test]
    fn test_progress_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let tracker = ProgressTracker::new();
        store.save_progress("carol", &tracker).unwrap();
        assert!(dir.path().join("progress").join("carol.json").exists());
        assert_eq!(store.load_progress("carol").unwrap(), Some(tracker));
        assert!(store.load_progress("dave").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_escape_and_bad_json() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(
            store.save_topology("../x", "ex1", &Topology::default()),
            Err(StoreError::InvalidKey(_))
        ));

        let path = dir.path().join("progress");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("erin.json"), "{ not json").unwrap();
        assert!(matches!(
            store.load_progress("erin"),
            Err(StoreError::Serialization(_))
        ));
    }
}
