//! Layout persistence: saved node coordinates keyed by a schema/file
//! identity, backed by an injected key/value capability. Storage failures
//! never propagate; the engine degrades to "no saved layout".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::graph::{GraphNode, Position};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage access failed: {0}")]
    Storage(String),
}

/// Persistent key/value capability, browser-local storage in the original
/// host and an in-memory map in tests.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// HashMap-backed store for tests and non-browser hosts.
#[derive(Default)]
pub struct MemoryStore {
    data: std::sync::Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Wire format: `[{"id": ..., "position": {"x": ..., "y": ...}}, ...]`.
#[derive(Debug, Serialize, Deserialize)]
struct SavedNode {
    id: String,
    position: Position,
}

pub struct LayoutStore<'a> {
    storage: &'a dyn KeyValueStore,
}

impl<'a> LayoutStore<'a> {
    pub fn new(storage: &'a dyn KeyValueStore) -> Self {
        Self { storage }
    }

    /// Deterministic storage key from a schema identity and an optional
    /// file identity, normalized to `[A-Za-z0-9_-]`.
    pub fn storage_key(schema: &str, file: Option<&str>) -> String {
        let normalize = |s: &str| -> String {
            s.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect()
        };
        match file {
            Some(f) => format!("ifcgraph-layout-{}-{}", normalize(schema), normalize(f)),
            None => format!("ifcgraph-layout-{}", normalize(schema)),
        }
    }

    /// Persist every node's position. Best effort: failures are logged and
    /// swallowed.
    pub fn save(&self, key: &str, nodes: &[GraphNode]) {
        let saved: Vec<SavedNode> = nodes
            .iter()
            .map(|n| SavedNode {
                id: n.id.clone(),
                position: n.position,
            })
            .collect();
        let payload = match serde_json::to_string(&saved) {
            Ok(p) => p,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize layout");
                return;
            }
        };
        if let Err(e) = self.storage.set(key, &payload) {
            warn!(key, error = %e, "failed to persist layout");
        }
    }

    /// Load a saved layout. `None` on missing or corrupt data, never an
    /// error.
    pub fn load(&self, key: &str) -> Option<HashMap<String, Position>> {
        let payload = match self.storage.get(key) {
            Ok(p) => p?,
            Err(e) => {
                warn!(key, error = %e, "failed to read saved layout");
                return None;
            }
        };
        match serde_json::from_str::<Vec<SavedNode>>(&payload) {
            Ok(saved) => Some(saved.into_iter().map(|s| (s.id, s.position)).collect()),
            Err(e) => {
                warn!(key, error = %e, "discarding corrupt saved layout");
                None
            }
        }
    }

    /// Apply a saved layout to the current nodes. Positions change only
    /// when every node id is covered; a partial record is stale, gets
    /// removed, and the caller should fall back to the layout engine.
    pub fn apply(&self, key: &str, nodes: &mut [GraphNode], saved: &HashMap<String, Position>) -> bool {
        if !nodes.iter().all(|n| saved.contains_key(&n.id)) {
            warn!(key, "saved layout does not cover current nodes, discarding");
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "failed to remove stale layout");
            }
            return false;
        }
        for node in nodes.iter_mut() {
            node.position = saved[&node.id];
        }
        true
    }
}
