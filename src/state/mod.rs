use crate::config::TreeConfig;
use crate::coordinator::{MutationCoordinator, TreeEvent};
use crate::engine::{DropPosition, DropTarget};
use crate::storage::{LocalStorage, TreeStore};
use leptos::logging::{error, warn};
use leptos::prelude::*;
use std::collections::BTreeSet;

const STORAGE_UNAVAILABLE: &str = "Storage is unavailable; changes will only last for this session.";

/// Reactive state of one mounted tree.
///
/// Built fresh by each `TreeList` and handed down through context; two trees on
/// the same page never share a session.
#[derive(Clone, Copy)]
pub(crate) struct TreeListState {
    pub config: StoredValue<TreeConfig>,
    store: StoredValue<TreeStore<LocalStorage>>,

    /// The live tree. Only `dispatch` and `save` write to it.
    pub session: RwSignal<MutationCoordinator>,

    pub expanded: RwSignal<BTreeSet<String>>,
    pub selected: RwSignal<Vec<String>>,

    /// Item currently being renamed, with its edit buffer.
    pub renaming: RwSignal<Option<String>>,
    pub rename_value: RwSignal<String>,

    /// Row and band the pointer is over while dragging.
    pub drop_hint: RwSignal<Option<(String, DropPosition)>>,

    pub last_error: RwSignal<Option<String>>,
}

impl TreeListState {
    pub fn new(config: TreeConfig) -> Self {
        let store = TreeStore::new(LocalStorage, config.storage_key.clone());
        let session = MutationCoordinator::load(&store, config.capabilities);
        let expanded = session.expanded_item_ids().into_iter().collect();

        let last_error = if LocalStorage::is_available() {
            None
        } else {
            warn!("[tree] localStorage is unavailable; edits stay in memory");
            Some(STORAGE_UNAVAILABLE.to_string())
        };

        Self {
            config: StoredValue::new(config),
            store: StoredValue::new(store),
            session: RwSignal::new(session),
            expanded: RwSignal::new(expanded),
            selected: RwSignal::new(vec![]),
            renaming: RwSignal::new(None),
            rename_value: RwSignal::new(String::new()),
            drop_hint: RwSignal::new(None),
            last_error: RwSignal::new(last_error),
        }
    }

    /// Forwards one event to the coordinator and reports a rejection inline.
    pub fn dispatch(&self, event: TreeEvent) -> bool {
        let opened = match &event {
            TreeEvent::Drop {
                target: DropTarget::Item { target_item },
                ..
            } => Some(target_item.clone()),
            _ => None,
        };
        let is_drop = matches!(event, TreeEvent::Drop { .. });

        let mut outcome = Ok(());
        self.session.update(|s| outcome = s.apply(event));
        if is_drop {
            self.drop_hint.set(None);
        }

        match outcome {
            Ok(()) => {
                if let Some(id) = opened {
                    self.expanded.update(|xs| {
                        xs.insert(id);
                    });
                }
                true
            }
            Err(e) => {
                if e.is_recoverable() {
                    warn!("[tree] event rejected: {e}");
                } else {
                    error!("[tree] event hit a corrupt tree: {e}");
                }
                self.last_error.set(Some(e.to_string()));
                false
            }
        }
    }

    /// Writes the live tree to storage; the save button hides once this succeeds.
    pub fn save(&self) {
        let mut outcome = Ok(vec![]);
        self.store
            .with_value(|store| self.session.update(|s| outcome = s.save(store)));

        match outcome {
            Ok(_) => self.last_error.set(None),
            Err(e) if e.is_recoverable() => {
                warn!("[tree] save failed: {e}");
                self.last_error.set(Some(format!("Changes were not saved: {e}")));
            }
            Err(e) => {
                error!("[tree] refusing to save a corrupt tree: {e}");
                self.last_error.set(Some(format!(
                    "The tree is inconsistent and was not saved: {e}"
                )));
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.session.with(|s| s.is_dirty())
    }

    pub fn toggle_expanded(&self, id: &str) {
        self.expanded.update(|xs| {
            if !xs.remove(id) {
                xs.insert(id.to_string());
            }
        });
    }

    /// Selects `id`; `additive` toggles it within the current selection.
    pub fn select(&self, id: &str, additive: bool) {
        let mut next = if additive {
            self.selected.get_untracked()
        } else {
            vec![]
        };
        match next.iter().position(|x| x == id) {
            Some(pos) if additive => {
                next.remove(pos);
            }
            Some(_) => {}
            None => next.push(id.to_string()),
        }

        self.selected.set(next.clone());
        self.dispatch(TreeEvent::SelectItems(next));
    }

    /// Items a drag starting on `id` carries: the selection when `id` is in it.
    pub fn drag_items_for(&self, id: &str) -> Vec<String> {
        let selected = self.selected.get_untracked();
        if selected.iter().any(|x| x == id) {
            selected
        } else {
            vec![id.to_string()]
        }
    }

    pub fn start_rename(&self, id: &str) {
        if !self.session.with_untracked(|s| s.capabilities().can_rename) {
            return;
        }
        let title = self
            .session
            .with_untracked(|s| s.items().get(id).map(|i| i.title().to_string()));
        if let Some(title) = title {
            self.rename_value.set(title);
            self.renaming.set(Some(id.to_string()));
        }
    }

    /// Commits the edit buffer. Blank or unchanged labels are discarded.
    pub fn commit_rename(&self) {
        let Some(id) = self.renaming.get_untracked() else {
            return;
        };
        self.renaming.set(None);

        let text = self.rename_value.get_untracked();
        let unchanged = self
            .session
            .with_untracked(|s| s.items().get(&id).map(|i| i.title() == text))
            .unwrap_or(true);
        if text.trim().is_empty() || unchanged {
            return;
        }

        self.dispatch(TreeEvent::Rename { id, text });
    }

    pub fn cancel_rename(&self) {
        self.renaming.set(None);
    }
}
