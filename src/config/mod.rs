use crate::engine::Capabilities;
use crate::storage::TREE_STORAGE_KEY;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    /// localStorage key holding the persisted node list.
    pub storage_key: String,
    pub tree_id: String,
    pub tree_label: String,
    pub capabilities: Capabilities,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            storage_key: TREE_STORAGE_KEY.to_string(),
            tree_id: "tree-1".to_string(),
            tree_label: "Tree Example".to_string(),
            capabilities: Capabilities::default(),
        }
    }
}

impl TreeConfig {
    /// Defaults, overridden by `window.ENV` when the page provides it.
    pub fn new() -> Self {
        let mut config = Self::default();

        // Both `TREE_STORAGE_KEY` and `tree_storage_key` are accepted.
        if let Some(key) = env_string(&["TREE_STORAGE_KEY", "tree_storage_key"]) {
            config.apply_storage_key(&key);
        }

        config
    }

    /// Replaces the storage key unless `key` is blank.
    pub(crate) fn apply_storage_key(&mut self, key: &str) {
        let key = key.trim();
        if !key.is_empty() {
            self.storage_key = key.to_string();
        }
    }
}

fn env_string(names: &[&str]) -> Option<String> {
    #[cfg(target_arch = "wasm32")]
    {
        let env = web_sys::window()?.get("ENV")?;
        if env.is_undefined() || !env.is_object() {
            return None;
        }
        for name in names {
            if let Ok(value) = js_sys::Reflect::get(&env, &(*name).into()) {
                if let Some(s) = value.as_string() {
                    return Some(s);
                }
            }
        }
        None
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = names;
        None
    }
}
