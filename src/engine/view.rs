use super::DropTarget;
use crate::models::FlatMap;
use std::collections::{BTreeSet, HashSet};

/// Where the pointer sits over a hovered row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropPosition {
    Before,
    Inside,
    After,
}

impl DropPosition {
    /// Top and bottom quarters of a row insert next to it; the middle drops onto it.
    pub fn from_offset(offset: f64, height: f64) -> Self {
        if height <= 0.0 {
            return Self::Inside;
        }
        let ratio = offset / height;
        if ratio < 0.25 {
            Self::Before
        } else if ratio > 0.75 {
            Self::After
        } else {
            Self::Inside
        }
    }
}

/// Resolves a hover position over row `id` to a drop target.
pub fn drop_target_for(map: &FlatMap, id: &str, position: DropPosition) -> Option<DropTarget> {
    if position == DropPosition::Inside {
        return map.contains(id).then(|| DropTarget::Item {
            target_item: id.to_string(),
        });
    }

    let parents = map.parent_index();
    let parent = parents.get(id)?;
    let index = map.children_of(parent).iter().position(|c| c == id)?;
    let child_index = match position {
        DropPosition::After => index + 1,
        _ => index,
    };

    Some(DropTarget::BetweenItems {
        parent_item: parent.to_string(),
        child_index,
    })
}

/// One rendered line of the tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VisibleRow {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub is_folder: bool,
    pub has_children: bool,
    pub expanded: bool,
}

/// Rows in display order, skipping the children of collapsed items.
pub fn visible_rows(map: &FlatMap, expanded: &BTreeSet<String>) -> Vec<VisibleRow> {
    let mut rows = vec![];
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<(&str, usize)> = map
        .root_children()
        .iter()
        .rev()
        .map(|id| (id.as_str(), 0))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(item) = map.get(id) else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }

        let is_expanded = item.has_children() && expanded.contains(id);
        rows.push(VisibleRow {
            id: id.to_string(),
            title: item.title().to_string(),
            depth,
            is_folder: item.is_folder,
            has_children: item.has_children(),
            expanded: is_expanded,
        });

        if is_expanded {
            stack.extend(item.children.iter().rev().map(|c| (c.as_str(), depth + 1)));
        }
    }

    rows
}
