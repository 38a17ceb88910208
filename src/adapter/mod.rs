use crate::error::{TreeError, TreeResult};
use crate::models::{FlatItem, FlatMap, Node, NodeList, ROOT_ID};
use std::collections::HashSet;

/// Rejects node lists that cannot be flattened without losing entries.
///
/// Every id must be unique across the whole tree, and no node may use the
/// reserved root id.
pub fn validate_node_list(nodes: &[Node]) -> TreeResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&Node> = nodes.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if node.id == ROOT_ID || !seen.insert(node.id.as_str()) {
            return Err(TreeError::DuplicateId(node.id.clone()));
        }
        stack.extend(node.nodes.iter().rev());
    }

    Ok(())
}

/// Builds the flat, id-indexed map from a hierarchical node list.
///
/// `isFolder` is derived from whether a node has children. The root entry
/// lists the top-level ids in their original order.
pub fn to_flat_map(nodes: &[Node]) -> TreeResult<FlatMap> {
    validate_node_list(nodes)?;

    let mut map = FlatMap::new();
    if let Some(root) = map.root_mut() {
        root.children = nodes.iter().map(|n| n.id.clone()).collect();
    }

    let mut stack: Vec<&Node> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        map.insert(FlatItem {
            index: node.id.clone(),
            is_folder: !node.nodes.is_empty(),
            children: node.nodes.iter().map(|c| c.id.clone()).collect(),
            data: node.text.clone(),
        });
        stack.extend(node.nodes.iter());
    }

    Ok(map)
}

struct Frame<'a> {
    item: &'a FlatItem,
    next: usize,
    nodes: Vec<Node>,
}

impl<'a> Frame<'a> {
    fn new(item: &'a FlatItem) -> Self {
        Self {
            item,
            next: 0,
            nodes: Vec::with_capacity(item.children.len()),
        }
    }
}

/// Rebuilds the node list from the flat map, starting at the root entry.
///
/// Items that no `children` list reaches are not part of the result.
///
/// # Errors
/// - `DanglingReference` when a `children` entry has no item (or the root is missing).
/// - `RepeatedReference` when an id is reached twice (shared child or cycle).
pub fn to_node_list(map: &FlatMap) -> TreeResult<NodeList> {
    let root = map.root().ok_or_else(|| TreeError::DanglingReference {
        parent: ROOT_ID.to_string(),
        id: ROOT_ID.to_string(),
    })?;

    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(ROOT_ID);

    let mut stack = vec![Frame::new(root)];
    while let Some(frame) = stack.last_mut() {
        let item = frame.item;
        if let Some(child_id) = item.children.get(frame.next) {
            frame.next += 1;

            let child = map
                .get(child_id)
                .ok_or_else(|| TreeError::DanglingReference {
                    parent: item.index.clone(),
                    id: child_id.clone(),
                })?;
            if !seen.insert(child_id.as_str()) {
                return Err(TreeError::RepeatedReference(child_id.clone()));
            }

            stack.push(Frame::new(child));
            continue;
        }

        let Some(done) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some(parent) => parent.nodes.push(Node {
                id: done.item.index.clone(),
                text: done.item.data.clone(),
                nodes: done.nodes,
            }),
            None => return Ok(done.nodes),
        }
    }

    Ok(vec![])
}

/// Ids the view should render expanded on first paint.
pub fn expanded_item_ids(map: &FlatMap) -> Vec<String> {
    map.iter()
        .filter(|item| item.has_children())
        .map(|item| item.index.clone())
        .collect()
}


#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Builds a forest from `(parent pick, text)` pairs.
    ///
    /// Node `i` hangs under an earlier node chosen by its pick, or at the top
    /// level when the pick lands on `i` itself. Ids are `n0`, `n1`, ...
    fn forest(shape: &[(usize, String)]) -> NodeList {
        let n = shape.len();
        let mut children: Vec<Vec<usize>> = vec![vec![]; n];
        let mut top = vec![];
        for (i, (pick, _)) in shape.iter().enumerate() {
            let parent = pick % (i + 1);
            if parent == i {
                top.push(i);
            } else {
                children[parent].push(i);
            }
        }

        // Children always have larger indices, so they are built first.
        let mut built: Vec<Option<Node>> = vec![None; n];
        for i in (0..n).rev() {
            let nodes: Vec<Node> = children[i].iter().filter_map(|c| built[*c].take()).collect();
            built[i] = Some(Node::with_children(format!("n{i}"), shape[i].1.clone(), nodes));
        }
        top.iter().filter_map(|i| built[*i].take()).collect()
    }

    /// Arbitrary node lists with unique ids.
    pub(crate) fn arb_node_list() -> impl Strategy<Value = NodeList> {
        proptest::collection::vec((any::<usize>(), "[a-zA-Z0-9 ]{0,8}"), 0..40)
            .prop_map(|shape| forest(&shape))
    }

    proptest! {
        #[test]
        fn round_trip_restores_any_unique_id_forest(list in arb_node_list()) {
            let map = to_flat_map(&list).expect("generated ids are unique");
            prop_assert_eq!(map.check_invariants(), Ok(()));
            prop_assert_eq!(to_node_list(&map), Ok(list));
        }

        #[test]
        fn flat_map_holds_every_node_plus_root(list in arb_node_list()) {
            let mut count = 0;
            let mut stack: Vec<&Node> = list.iter().collect();
            while let Some(node) = stack.pop() {
                count += 1;
                stack.extend(node.nodes.iter());
            }

            let map = to_flat_map(&list).expect("generated ids are unique");
            prop_assert_eq!(map.len(), count + 1);
            prop_assert_eq!(map.root_children().len(), list.len());
        }
    }
}
