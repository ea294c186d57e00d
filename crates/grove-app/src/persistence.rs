//! Persisted UI state: open and selected node ids
//!
//! Instances write through a small [`KeyValueStore`] so hosts can back it
//! with whatever they have (a cookie jar, a settings file, memory). Values
//! are comma-joined id lists stored under `<prefix>open` and
//! `<prefix>selected`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use grove_core::prelude::*;
use grove_core::NodeId;

/// Minimal string key-value persistence hook.
pub trait KeyValueStore: Send {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory store. Clones share the same map, so a host can hand one
/// clone to an instance and keep another to inspect or reuse.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::config("memory store poisoned"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileStore
// ─────────────────────────────────────────────────────────────────────────────

/// JSON object file of string values, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: HashMap<String, String>,
}

impl FileStore {
    const FILENAME: &'static str = "state.json";

    /// Open (or start) a store at `path`. An unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt state file {:?}: {}", path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, items }
    }

    /// Store under the user's data directory (`~/.local/share/grove/state.json`).
    pub fn default_location() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::open(base.join("grove").join(Self::FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.items)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Persisted state
// ─────────────────────────────────────────────────────────────────────────────

/// Open and selected ids as read from a store. `None` means nothing was
/// persisted under that key, which is different from an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub open: Option<Vec<NodeId>>,
    pub selected: Option<Vec<NodeId>>,
}

fn open_key(prefix: &str) -> String {
    format!("{prefix}open")
}

fn selected_key(prefix: &str) -> String {
    format!("{prefix}selected")
}

fn decode(value: &str) -> Vec<NodeId> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(NodeId::from)
        .collect()
}

fn encode(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

impl PersistedState {
    pub fn read(store: &dyn KeyValueStore, prefix: &str) -> Self {
        Self {
            open: store.get_item(&open_key(prefix)).map(|v| decode(&v)),
            selected: store.get_item(&selected_key(prefix)).map(|v| decode(&v)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_none() && self.selected.is_none()
    }
}

/// Write the open set (and the selection, when given).
pub fn write_state(
    store: &mut dyn KeyValueStore,
    prefix: &str,
    open: &[NodeId],
    selected: Option<&[NodeId]>,
) -> Result<()> {
    store.set_item(&open_key(prefix), &encode(open))?;
    if let Some(selected) = selected {
        store.set_item(&selected_key(prefix), &encode(selected))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ids(list: &[&str]) -> Vec<NodeId> {
        list.iter().map(|s| NodeId::new(*s)).collect()
    }

    #[test]
    fn test_memory_store_clones_share_items() {
        let mut store = MemoryStore::new();
        let view = store.clone();
        store.set_item("k", "v").unwrap();
        assert_eq!(view.get_item("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_write_then_read_state() {
        let mut store = MemoryStore::new();
        write_state(&mut store, "t_", &ids(&["a", "b"]), Some(&ids(&["c"]))).unwrap();
        let state = PersistedState::read(&store, "t_");
        assert_eq!(state.open, Some(ids(&["a", "b"])));
        assert_eq!(state.selected, Some(ids(&["c"])));
        assert_eq!(store.get_item("t_open").as_deref(), Some("a,b"));
    }

    #[test]
    fn test_empty_list_is_distinct_from_missing() {
        let mut store = MemoryStore::new();
        write_state(&mut store, "t_", &[], None).unwrap();
        let state = PersistedState::read(&store, "t_");
        assert_eq!(state.open, Some(vec![]));
        assert_eq!(state.selected, None);
        assert!(PersistedState::read(&store, "other_").is_empty());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grove").join("state.json");
        let mut store = FileStore::open(&path);
        store.set_item("grove_open", "x,y").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get_item("grove_open").as_deref(), Some("x,y"));
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::open(&path);
        assert!(store.get_item("anything").is_none());
    }
}
