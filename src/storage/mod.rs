use crate::adapter::validate_node_list;
use crate::error::{TreeError, TreeResult};
use crate::models::{Node, NodeList};
use leptos::logging::{error, log, warn};
use std::cell::RefCell;
use std::collections::BTreeMap;

pub const TREE_STORAGE_KEY: &str = "tree";

/// Synchronous string key-value backend.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> TreeResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> TreeResult<()>;
}

/// `window.localStorage`.
///
/// The handle is looked up on every call, so a storage that becomes
/// unavailable mid-session turns into `StorageUnavailable` errors rather than
/// stale writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> TreeResult<web_sys::Storage> {
        let window = web_sys::window().ok_or_else(|| TreeError::storage("no window"))?;
        window
            .local_storage()
            .map_err(|e| TreeError::storage(format!("{e:?}")))?
            .ok_or_else(|| TreeError::storage("localStorage is disabled"))
    }

    /// Whether the browser lets us use local storage at all.
    pub fn is_available() -> bool {
        Self::storage().is_ok()
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> TreeResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| TreeError::storage(format!("{e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> TreeResult<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| TreeError::storage(format!("{e:?}")))
    }
}

/// In-process store for native builds and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call, like a locked-down browser profile.
    pub fn unavailable() -> Self {
        Self {
            entries: RefCell::default(),
            unavailable: true,
        }
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> TreeResult<Option<String>> {
        if self.unavailable {
            return Err(TreeError::storage("memory store disabled"));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> TreeResult<()> {
        if self.unavailable {
            return Err(TreeError::storage("memory store disabled"));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the persisted node list under one key.
#[derive(Debug)]
pub struct TreeStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> TreeStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Reads the stored list, surfacing why it could not be used.
    ///
    /// An absent key is an empty tree, not an error.
    pub fn load_checked(&self) -> TreeResult<NodeList> {
        let Some(raw) = self.store.get_item(&self.key)? else {
            return Ok(vec![]);
        };
        let nodes: NodeList = serde_json::from_str(&raw).map_err(TreeError::parse)?;
        validate_node_list(&nodes)?;
        Ok(nodes)
    }

    /// Reads the stored list; any failure yields an empty tree.
    pub fn load(&self) -> NodeList {
        match self.load_checked() {
            Ok(nodes) => {
                log!("[tree] loaded {} top-level items from `{}`", nodes.len(), self.key);
                nodes
            }
            Err(e @ TreeError::StorageUnavailable(_)) => {
                warn!("[tree] {e}; continuing without persistence");
                vec![]
            }
            Err(e) => {
                error!("[tree] ignoring stored tree under `{}`: {e}", self.key);
                vec![]
            }
        }
    }

    /// Serializes `nodes` and writes them synchronously.
    pub fn save(&self, nodes: &[Node]) -> TreeResult<()> {
        let json = serde_json::to_string(nodes).map_err(TreeError::serialize)?;
        self.store.set_item(&self.key, &json)?;
        log!("[tree] saved {} top-level items to `{}`", nodes.len(), self.key);
        Ok(())
    }
}
