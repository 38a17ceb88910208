use crate::adapter::{expanded_item_ids, to_flat_map, to_node_list};
use crate::engine::{move_items, rename_item, Capabilities, DropTarget};
use crate::error::TreeResult;
use crate::models::{FlatMap, NodeList};
use crate::storage::{KeyValueStore, TreeStore};
use leptos::logging::{log, warn};

/// Structural-change notifications coming from the tree view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    /// Inline rename committed.
    Rename { id: String, text: String },

    /// Drag gesture finished on `target`.
    Drop { items: Vec<String>, target: DropTarget },

    /// Selection changed. Observational only.
    SelectItems(Vec<String>),

    DragStart(Vec<String>),
    DragEnd,
}

/// Sole writer of one session's live tree.
///
/// Owns the flat map for the lifetime of the session, applies the structural
/// edit for each event plus the folder-forcing drop policy, and tracks whether
/// anything changed since the last successful save.
#[derive(Clone, Debug)]
pub struct MutationCoordinator {
    items: FlatMap,
    caps: Capabilities,
    dirty: bool,
    dragging: Vec<String>,
}

impl MutationCoordinator {
    pub fn new(items: FlatMap, caps: Capabilities) -> Self {
        Self {
            items,
            caps,
            dirty: false,
            dragging: vec![],
        }
    }

    /// Builds a clean session from a persisted node list.
    pub fn from_nodes(nodes: &NodeList, caps: Capabilities) -> TreeResult<Self> {
        Ok(Self::new(to_flat_map(nodes)?, caps))
    }

    /// Loads the persisted tree and starts a clean session on it.
    ///
    /// `TreeStore::load` has already validated the list, so this never fails;
    /// a rejected list degrades to an empty tree.
    pub fn load<S: KeyValueStore>(store: &TreeStore<S>, caps: Capabilities) -> Self {
        let nodes = store.load();
        match to_flat_map(&nodes) {
            Ok(items) => Self::new(items, caps),
            Err(e) => {
                warn!("[tree] starting empty: {e}");
                Self::new(FlatMap::new(), caps)
            }
        }
    }

    pub fn items(&self) -> &FlatMap {
        &self.items
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_dragging(&self) -> bool {
        !self.dragging.is_empty()
    }

    pub fn dragging_items(&self) -> &[String] {
        &self.dragging
    }

    pub fn expanded_item_ids(&self) -> Vec<String> {
        expanded_item_ids(&self.items)
    }

    /// Applies one event. A rejected event leaves the session untouched.
    pub fn apply(&mut self, event: TreeEvent) -> TreeResult<()> {
        match event {
            TreeEvent::Rename { id, text } => {
                rename_item(&mut self.items, &id, &text, &self.caps)?;
                self.dirty = true;
            }
            TreeEvent::Drop { items, target } => {
                move_items(&mut self.items, &items, &target, &self.caps)?;

                // Anything dropped directly onto an item turns it into a folder.
                if let DropTarget::Item { target_item } = &target {
                    if let Some(item) = self.items.get_mut(target_item) {
                        item.is_folder = true;
                    }
                }

                self.dirty = true;
                self.dragging.clear();
                debug_assert!(self.items.check_invariants().is_ok());
            }
            TreeEvent::SelectItems(ids) => {
                log!("[tree] selected {ids:?}");
            }
            TreeEvent::DragStart(ids) => {
                self.dragging = ids;
            }
            TreeEvent::DragEnd => {
                self.dragging.clear();
            }
        }
        Ok(())
    }

    /// Converts the live tree and writes it through `store`.
    ///
    /// The dirty flag is cleared only once the write went through; a failed
    /// conversion aborts before anything is written.
    pub fn save<S: KeyValueStore>(&mut self, store: &TreeStore<S>) -> TreeResult<NodeList> {
        let nodes = to_node_list(&self.items)?;
        store.save(&nodes)?;
        self.dirty = false;
        Ok(nodes)
    }
}


#[cfg(all(test, not(target_arch = "wasm32")))]
mod property_tests {
    use super::*;
    use crate::adapter::property_tests::arb_node_list;
    use crate::models::{Node, ROOT_ID};
    use proptest::prelude::*;

    /// Dragged picks, target kind, target pick, child index.
    type DropSpec = (Vec<usize>, u8, usize, usize);

    fn to_event(ids: &[String], spec: &DropSpec) -> TreeEvent {
        let (picks, kind, target, child_index) = spec;
        let pick = |i: usize| ids[i % ids.len()].clone();

        let target = match kind % 3 {
            0 => DropTarget::Item {
                target_item: pick(*target),
            },
            1 => DropTarget::BetweenItems {
                parent_item: if target % (ids.len() + 1) == ids.len() {
                    ROOT_ID.to_string()
                } else {
                    pick(*target)
                },
                child_index: *child_index,
            },
            _ => DropTarget::Root,
        };

        TreeEvent::Drop {
            items: picks.iter().map(|i| pick(*i)).collect(),
            target,
        }
    }

    fn count(list: &[Node]) -> usize {
        let mut n = 0;
        let mut stack: Vec<&Node> = list.iter().collect();
        while let Some(node) = stack.pop() {
            n += 1;
            stack.extend(node.nodes.iter());
        }
        n
    }

    fn arb_drops() -> impl Strategy<Value = Vec<DropSpec>> {
        proptest::collection::vec(
            (
                proptest::collection::vec(any::<usize>(), 1..4),
                any::<u8>(),
                any::<usize>(),
                0usize..6,
            ),
            0..25,
        )
    }

    proptest! {
        #[test]
        fn random_drops_keep_the_tree_well_formed(list in arb_node_list(), drops in arb_drops()) {
            let mut s = MutationCoordinator::from_nodes(&list, Capabilities::default())
                .expect("generated ids are unique");
            let ids: Vec<String> = s
                .items()
                .iter()
                .filter(|item| !item.is_root())
                .map(|item| item.index.clone())
                .collect();
            if ids.is_empty() {
                return Ok(());
            }

            for spec in &drops {
                let before = s.items().clone();
                let was_dirty = s.is_dirty();
                match s.apply(to_event(&ids, spec)) {
                    Ok(()) => {
                        prop_assert!(s.is_dirty());
                    }
                    Err(_) => {
                        prop_assert_eq!(s.items(), &before);
                        prop_assert_eq!(s.is_dirty(), was_dirty);
                    }
                }
                prop_assert_eq!(s.items().check_invariants(), Ok(()));
            }

            // Moves never orphan anything, so every item is written back.
            let saved = to_node_list(s.items());
            prop_assert_eq!(saved.map(|l| count(&l)), Ok(ids.len()));
        }
    }
}
