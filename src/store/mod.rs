//! Persistence collaborators.
//!
//! The session and the progress tracker do not know where data lives; they
//! talk to a [`TopologyStore`]. Saving is always an upsert and loading a
//! missing record is `Ok(None)`, not an error.

pub mod json_file;
pub mod memory;

use log::info;
use thiserror::Error;

use crate::exercise::{Exercise, ExerciseProgress, ExerciseResult, ProgressTracker};
use crate::topology::Topology;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Where saved topologies and progress records live
pub trait TopologyStore {
    fn load_topology(&self, user_id: &str, exercise_id: &str) -> Result<Option<Topology>, StoreError>;

    fn save_topology(&self, user_id: &str, exercise_id: &str, topology: &Topology) -> Result<(), StoreError>;

    fn load_progress(&self, user_id: &str) -> Result<Option<ProgressTracker>, StoreError>;

    fn save_progress(&self, user_id: &str, progress: &ProgressTracker) -> Result<(), StoreError>;
}

/// Fold one grading result into the user's stored progress and save it back
pub fn record_progress(
    store: &dyn TopologyStore,
    user_id: &str,
    exercise: &Exercise,
    result: &ExerciseResult,
) -> Result<ExerciseProgress, StoreError> {
    let mut tracker = store.load_progress(user_id)?.unwrap_or_default();
    let progress = tracker.record_result(exercise, result).clone();
    store.save_progress(user_id, &tracker)?;
    info!(
        "Recorded {} for user {}: best {}/{} after {} attempts",
        exercise.id, user_id, progress.best_score, progress.max_score, progress.attempts
    );
    Ok(progress)
}

/// Reject keys that are empty or could escape a storage directory
pub(crate) fn check_key(key: &str) -> Result<&str, StoreError> {
    let unsafe_key = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if unsafe_key {
        Err(StoreError::InvalidKey(key.to_string()))
    } else {
        Ok(key)
    }
}
