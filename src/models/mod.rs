use crate::error::{TreeError, TreeResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Id of the synthetic entry that lists the top-level items.
pub const ROOT_ID: &str = "root";

/// Label of the synthetic root entry.
pub const ROOT_LABEL: &str = "Root item";

/// One persisted tree entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub text: String,

    /// Owned children, in display order. Older blobs may omit empty lists.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn leaf(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            nodes: vec![],
        }
    }

    pub fn with_children(id: impl Into<String>, text: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            nodes,
        }
    }
}

/// Root-level nodes; the unit written to storage.
pub type NodeList = Vec<Node>;

/// One entry of the flat, id-indexed representation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FlatItem {
    pub index: String,

    #[serde(rename = "isFolder")]
    pub is_folder: bool,

    pub children: Vec<String>,

    pub data: String,
}

impl FlatItem {
    pub(crate) fn root() -> Self {
        Self {
            index: ROOT_ID.to_string(),
            is_folder: true,
            children: vec![],
            data: ROOT_LABEL.to_string(),
        }
    }

    /// Title accessor used by the view.
    pub fn title(&self) -> &str {
        &self.data
    }

    pub fn is_root(&self) -> bool {
        self.index == ROOT_ID
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Id-indexed items. A well-formed map holds a `root` entry.
///
/// Serializes as the plain `{ id: item }` object the view layer consumes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct FlatMap {
    items: BTreeMap<String, FlatItem>,
}

impl FlatMap {
    /// A map containing only an empty root.
    pub fn new() -> Self {
        let mut items = BTreeMap::new();
        items.insert(ROOT_ID.to_string(), FlatItem::root());
        Self { items }
    }

    pub fn get(&self, id: &str) -> Option<&FlatItem> {
        self.items.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut FlatItem> {
        self.items.get_mut(id)
    }

    pub(crate) fn insert(&mut self, item: FlatItem) -> Option<FlatItem> {
        self.items.insert(item.index.clone(), item)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn root(&self) -> Option<&FlatItem> {
        self.items.get(ROOT_ID)
    }

    pub(crate) fn root_mut(&mut self) -> Option<&mut FlatItem> {
        self.items.get_mut(ROOT_ID)
    }

    /// Top-level ids in display order.
    pub fn root_children(&self) -> &[String] {
        self.root().map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.get(id).map(|i| i.children.as_slice()).unwrap_or(&[])
    }

    /// Number of entries, root included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_children().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlatItem> {
        self.items.values()
    }

    /// child id -> parent id for every `children` edge.
    pub(crate) fn parent_index(&self) -> HashMap<&str, &str> {
        let mut parents = HashMap::new();
        for item in self.items.values() {
            for child in &item.children {
                parents.insert(child.as_str(), item.index.as_str());
            }
        }
        parents
    }

    /// Verifies the structural invariants of the map.
    ///
    /// Orphans (items no `children` list reaches) are tolerated; they are
    /// simply not written back on save.
    pub fn check_invariants(&self) -> TreeResult<()> {
        let Some(root) = self.root() else {
            return Err(TreeError::DanglingReference {
                parent: ROOT_ID.to_string(),
                id: ROOT_ID.to_string(),
            });
        };
        if !root.is_folder {
            return Err(TreeError::NotAFolder(ROOT_ID.to_string()));
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        for item in self.items.values() {
            if item.has_children() && !item.is_folder {
                return Err(TreeError::NotAFolder(item.index.clone()));
            }
            for child in &item.children {
                if !self.items.contains_key(child) {
                    return Err(TreeError::DanglingReference {
                        parent: item.index.clone(),
                        id: child.clone(),
                    });
                }
                if child == ROOT_ID || parents.insert(child.as_str(), item.index.as_str()).is_some() {
                    return Err(TreeError::RepeatedReference(child.clone()));
                }
            }
        }

        // With at most one parent per id, a cycle is a parent chain longer than the map.
        for id in self.items.keys() {
            let mut cur = id.as_str();
            let mut steps = 0;
            while let Some(parent) = parents.get(cur) {
                steps += 1;
                if steps > self.items.len() {
                    return Err(TreeError::RepeatedReference(id.clone()));
                }
                cur = *parent;
            }
        }

        Ok(())
    }
}

impl Default for FlatMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<FlatItem> for FlatMap {
    /// Collects items into a map; a root entry is added when none is given.
    fn from_iter<T: IntoIterator<Item = FlatItem>>(iter: T) -> Self {
        let mut map = Self::new();
        for item in iter {
            map.insert(item);
        }
        map
    }
}
