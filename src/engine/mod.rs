use crate::error::{TreeError, TreeResult};
use crate::models::{FlatMap, ROOT_ID};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

mod view;

pub use view::{drop_target_for, visible_rows, DropPosition, VisibleRow};

/// Kind of position an item was dropped at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum TargetType {
    Item,
    BetweenItems,
    Root,
}

/// Where a drag gesture ended.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "targetType", rename_all = "kebab-case")]
pub enum DropTarget {
    /// Dropped onto an item; the dragged items become its last children.
    #[serde(rename_all = "camelCase")]
    Item { target_item: String },

    /// Inserted among the children of `parent_item`, before the child
    /// currently at `child_index`.
    #[serde(rename_all = "camelCase")]
    BetweenItems {
        parent_item: String,
        child_index: usize,
    },

    /// Dropped on the empty area of the tree; appended at the top level.
    Root,
}

impl DropTarget {
    pub fn target_type(&self) -> TargetType {
        match self {
            Self::Item { .. } => TargetType::Item,
            Self::BetweenItems { .. } => TargetType::BetweenItems,
            Self::Root => TargetType::Root,
        }
    }

    /// Id of the item whose `children` receive the drop.
    pub fn parent_id(&self) -> &str {
        match self {
            Self::Item { target_item } => target_item,
            Self::BetweenItems { parent_item, .. } => parent_item,
            Self::Root => ROOT_ID,
        }
    }
}

/// Gestures the tree view allows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub can_drag_and_drop: bool,
    pub can_reorder_items: bool,
    pub can_rename: bool,
    pub can_drop_on_folder: bool,
    pub can_drop_on_non_folder: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_drag_and_drop: true,
            can_reorder_items: true,
            can_rename: true,
            can_drop_on_folder: true,
            can_drop_on_non_folder: true,
        }
    }
}

impl Capabilities {
    /// Whether `target` is an acceptable destination, ignoring tree shape.
    pub fn allows_drop(&self, map: &FlatMap, target: &DropTarget) -> bool {
        if !self.can_drag_and_drop {
            return false;
        }
        match target {
            DropTarget::Item { target_item } => match map.get(target_item) {
                Some(item) if item.is_folder => self.can_drop_on_folder,
                Some(_) => self.can_drop_on_non_folder,
                None => false,
            },
            DropTarget::BetweenItems { .. } => self.can_reorder_items,
            DropTarget::Root => true,
        }
    }
}

/// Whether `id` is `ancestor` or lies somewhere below it.
fn is_within(parents: &HashMap<String, String>, ancestor: &str, id: &str) -> bool {
    let mut cur = id;
    loop {
        if cur == ancestor {
            return true;
        }
        match parents.get(cur) {
            Some(parent) => cur = parent.as_str(),
            None => return false,
        }
    }
}

/// Moves `items` to `target`, keeping the map a strict tree.
///
/// This is the structural half of a drop; folder flags are left alone.
/// On error the map is not modified.
pub fn move_items(
    map: &mut FlatMap,
    items: &[String],
    target: &DropTarget,
    caps: &Capabilities,
) -> TreeResult<()> {
    if items.is_empty() {
        return Err(TreeError::DropRejected("nothing was dragged".to_string()));
    }
    if !caps.can_drag_and_drop {
        return Err(TreeError::CapabilityDisabled("drag and drop"));
    }

    let parent_id = target.parent_id().to_string();
    if !map.contains(&parent_id) {
        return Err(TreeError::ItemNotFound(parent_id));
    }
    if !caps.allows_drop(map, target) {
        return Err(TreeError::DropRejected(format!(
            "{} drops are disabled for `{parent_id}`",
            target.target_type()
        )));
    }
    // Only item drops may turn a leaf into a folder.
    if let DropTarget::BetweenItems { .. } = target {
        if map.get(&parent_id).is_some_and(|p| !p.is_folder) {
            return Err(TreeError::DropRejected(format!(
                "`{parent_id}` is not a folder"
            )));
        }
    }

    let parents: HashMap<String, String> = map
        .parent_index()
        .into_iter()
        .map(|(c, p)| (c.to_string(), p.to_string()))
        .collect();

    let mut unique: Vec<&str> = vec![];
    for id in items {
        if id == ROOT_ID {
            return Err(TreeError::RootImmutable);
        }
        if !map.contains(id) {
            return Err(TreeError::ItemNotFound(id.clone()));
        }
        if is_within(&parents, id, &parent_id) {
            return Err(TreeError::DropRejected(format!(
                "cannot move `{id}` into its own subtree"
            )));
        }
        if !unique.contains(&id.as_str()) {
            unique.push(id);
        }
    }

    // Descendants of another dragged item travel with it.
    let dragged: HashSet<&str> = unique.iter().copied().collect();
    let moving: Vec<String> = unique
        .iter()
        .filter(|id| {
            let mut cur = **id;
            while let Some(parent) = parents.get(cur) {
                if dragged.contains(parent.as_str()) {
                    return false;
                }
                cur = parent.as_str();
            }
            true
        })
        .map(|id| id.to_string())
        .collect();

    let mut index = match target {
        DropTarget::BetweenItems { child_index, .. } => *child_index,
        _ => usize::MAX,
    };

    for id in &moving {
        let Some(old_parent) = parents.get(id) else {
            continue;
        };
        let Some(old) = map.get_mut(old_parent) else {
            continue;
        };
        if let Some(pos) = old.children.iter().position(|c| c == id) {
            if *old_parent == parent_id && pos < index {
                index -= 1;
            }
            old.children.remove(pos);
        }
    }

    let dest = map
        .get_mut(&parent_id)
        .ok_or_else(|| TreeError::ItemNotFound(parent_id.clone()))?;
    let at = index.min(dest.children.len());
    dest.children.splice(at..at, moving);

    Ok(())
}

/// Replaces the label of one item.
pub fn rename_item(map: &mut FlatMap, id: &str, text: &str, caps: &Capabilities) -> TreeResult<()> {
    if !caps.can_rename {
        return Err(TreeError::CapabilityDisabled("rename"));
    }
    if id == ROOT_ID {
        return Err(TreeError::RootImmutable);
    }
    let item = map
        .get_mut(id)
        .ok_or_else(|| TreeError::ItemNotFound(id.to_string()))?;
    item.data = text.to_string();
    Ok(())
}
