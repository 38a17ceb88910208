pub mod adapter;
mod app;
pub mod components;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod models;
mod state;
pub mod storage;

pub use adapter::{expanded_item_ids, to_flat_map, to_node_list};
pub use app::App;
pub use config::TreeConfig;
pub use coordinator::{MutationCoordinator, TreeEvent};
pub use engine::{Capabilities, DropTarget, TargetType};
pub use error::{TreeError, TreeResult};
pub use models::{FlatItem, FlatMap, Node, NodeList};
pub use storage::{KeyValueStore, LocalStorage, MemoryStore, TreeStore, TREE_STORAGE_KEY};

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const TEST_KEY: &str = "treelist-test";

    #[wasm_bindgen_test]
    fn test_local_storage_roundtrip() {
        assert!(LocalStorage::is_available());

        LocalStorage
            .set_item(TEST_KEY, "[]")
            .expect("localStorage should accept writes");
        assert_eq!(
            LocalStorage.get_item(TEST_KEY).expect("should read back"),
            Some("[]".to_string())
        );
    }

    #[wasm_bindgen_test]
    fn test_tree_survives_reload() {
        let store = TreeStore::new(LocalStorage, TEST_KEY);
        let nodes = vec![
            Node::with_children("a", "A", vec![Node::leaf("a1", "A1")]),
            Node::leaf("b", "B"),
        ];

        let mut session =
            MutationCoordinator::from_nodes(&nodes, Capabilities::default()).expect("valid");
        session
            .apply(TreeEvent::Drop {
                items: vec!["b".to_string()],
                target: DropTarget::Item {
                    target_item: "a".to_string(),
                },
            })
            .expect("drop should apply");
        session.save(&store).expect("save should succeed");

        let reloaded = MutationCoordinator::load(&store, Capabilities::default());
        assert_eq!(reloaded.items().children_of("a"), ["a1", "b"]);
        assert!(!reloaded.is_dirty());
    }

    #[wasm_bindgen_test]
    fn test_corrupt_value_loads_empty() {
        LocalStorage
            .set_item(TEST_KEY, "{not json")
            .expect("localStorage should accept writes");
        let store = TreeStore::new(LocalStorage, TEST_KEY);
        assert!(store.load().is_empty());
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}
