//! Fixed pre/post-order enumeration of a [`Tree`].
//!
//! Nodes are addressed by their arena [`NodeId`] (the traversal position). A
//! node's *key* is its postorder rank, which is what the name lookup returns.

use std::collections::HashMap;

use super::{NodeId, Tree};

/// Navigation primitives the node menu needs from a tree.
pub trait TreeTraversal {
    /// Position of the node whose postorder rank is `key`.
    fn postorder_select(&self, key: usize) -> Option<NodeId>;
    /// Preorder rank of `pos`.
    fn preorder(&self, pos: NodeId) -> usize;
    /// Position of the node whose preorder rank is `rank`.
    fn preorder_select(&self, rank: usize) -> Option<NodeId>;
    fn first_child(&self, pos: NodeId) -> Option<NodeId>;
    fn last_child(&self, pos: NodeId) -> Option<NodeId>;
    fn is_leaf(&self, pos: NodeId) -> bool;
    fn name(&self, pos: NodeId) -> Option<&str>;
    /// Postorder keys of every node carrying `name`, ascending.
    fn name_to_keys(&self, name: &str) -> &[usize];
}

#[derive(Debug, Clone, Default)]
pub struct TraversalIndex {
    preorder: Vec<NodeId>,
    postorder: Vec<NodeId>,
    preorder_rank: Vec<usize>,
    children: Vec<Vec<NodeId>>,
    names: Vec<Option<String>>,
    name_to_keys: HashMap<String, Vec<usize>>,
}

impl TraversalIndex {
    pub fn new(tree: &Tree) -> Self {
        let count = tree.nodes.len();
        let mut index = Self {
            preorder: Vec::with_capacity(count),
            postorder: Vec::with_capacity(count),
            preorder_rank: vec![0; count],
            children: tree.nodes.iter().map(|node| node.children.clone()).collect(),
            names: tree.nodes.iter().map(|node| node.name.clone()).collect(),
            name_to_keys: HashMap::new(),
        };

        let Some(root_id) = tree.root else {
            return index;
        };

        // Iterative walk so deep caterpillar trees do not blow the stack.
        let mut stack = vec![(root_id, false)];
        while let Some((node_id, expanded)) = stack.pop() {
            if expanded {
                index.postorder.push(node_id);
                continue;
            }
            index.preorder_rank[node_id] = index.preorder.len();
            index.preorder.push(node_id);
            stack.push((node_id, true));
            for &child_id in tree.nodes[node_id].children.iter().rev() {
                stack.push((child_id, false));
            }
        }

        for (key, &node_id) in index.postorder.iter().enumerate() {
            if let Some(name) = &index.names[node_id] {
                index.name_to_keys.entry(name.clone()).or_default().push(key);
            }
        }

        index
    }

    pub fn len(&self) -> usize {
        self.postorder.len()
    }

    /// Nodes in postorder, children before parents.
    pub fn postorder_nodes(&self) -> &[NodeId] {
        &self.postorder
    }

    pub fn children(&self, pos: NodeId) -> &[NodeId] {
        &self.children[pos]
    }
}

impl TreeTraversal for TraversalIndex {
    fn postorder_select(&self, key: usize) -> Option<NodeId> {
        self.postorder.get(key).copied()
    }

    fn preorder(&self, pos: NodeId) -> usize {
        self.preorder_rank[pos]
    }

    fn preorder_select(&self, rank: usize) -> Option<NodeId> {
        self.preorder.get(rank).copied()
    }

    fn first_child(&self, pos: NodeId) -> Option<NodeId> {
        self.children.get(pos)?.first().copied()
    }

    fn last_child(&self, pos: NodeId) -> Option<NodeId> {
        self.children.get(pos)?.last().copied()
    }

    fn is_leaf(&self, pos: NodeId) -> bool {
        self.children.get(pos).map_or(true, |children| children.is_empty())
    }

    fn name(&self, pos: NodeId) -> Option<&str> {
        self.names.get(pos)?.as_deref()
    }

    fn name_to_keys(&self, name: &str) -> &[usize] {
        self.name_to_keys
            .get(name)
            .map(|keys| keys.as_slice())
            .unwrap_or(&[])
    }
}

/// Names of the leaves below the internal node at `pos`.
///
/// A subtree occupies a contiguous preorder range: it starts at the first
/// child and ends at the leaf reached by following last children down. Unnamed
/// leaves are skipped. Returns an empty list when `pos` is a leaf.
pub fn subtree_tip_names<T: TreeTraversal + ?Sized>(tree: &T, pos: NodeId) -> Vec<String> {
    let Some(first) = tree.first_child(pos) else {
        return Vec::new();
    };
    let start = tree.preorder(first);

    let mut last = pos;
    while let Some(child) = tree.last_child(last) {
        last = child;
    }
    let end = tree.preorder(last);

    (start..=end)
        .filter_map(|rank| tree.preorder_select(rank))
        .filter(|&node| tree.is_leaf(node))
        .filter_map(|node| tree.name(node).map(str::to_string))
        .collect()
}


#[cfg(test)]
mod proptests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::tree::{Tree, TreeNode};
    use proptest::prelude::*;

    /// Random rooted tree: node `i` hangs below some earlier node.
    fn random_tree(parent_picks: &[usize]) -> Tree {
        let mut nodes = vec![TreeNode::new(0, Some("n0".to_string()), None)];
        for (offset, pick) in parent_picks.iter().enumerate() {
            let id = offset + 1;
            let parent = pick % id;
            let mut node = TreeNode::new(id, Some(format!("n{id}")), Some(1.0));
            node.parent = Some(parent);
            nodes.push(node);
            nodes[parent].children.push(id);
        }
        Tree::from_nodes(0, None, nodes)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_range_matches_recursive_leaves(picks in prop::collection::vec(any::<usize>(), 1..60)) {
            let tree = random_tree(&picks);
            let index = TraversalIndex::new(&tree);

            for node in tree.nodes.iter().filter(|node| !node.is_leaf()) {
                let expected: BTreeSet<String> = tree
                    .descendant_leaves(node.id)
                    .into_iter()
                    .filter_map(|id| tree.nodes[id].name.clone())
                    .collect();
                let actual: BTreeSet<String> =
                    subtree_tip_names(&index, node.id).into_iter().collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
