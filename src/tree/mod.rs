use phylotree::tree::{Node as PhyloNode, Tree as PhyloTree};

pub mod layout;
pub mod traversal;
pub mod view;

pub type NodeId = phylotree::tree::NodeId;

/// Phylogenetic tree stored as an arena of nodes indexed by [`NodeId`].
#[derive(Debug, Clone)]
pub struct Tree {
    pub id: usize,
    pub label: Option<String>,
    pub newick: String,
    pub root: Option<NodeId>,
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn new(id: usize, label: Option<String>, newick: String, phylo: &PhyloTree) -> Self {
        let root = phylo.get_root().ok();
        let nodes = Self::build_nodes_from_phylo(phylo);
        Self {
            id,
            label,
            newick,
            root,
            nodes,
        }
    }

    /// Build a tree from an already linked node list.
    pub fn from_nodes(id: usize, label: Option<String>, nodes: Vec<TreeNode>) -> Self {
        let root = nodes.iter().find(|node| node.is_root()).map(|node| node.id);
        Self {
            id,
            label,
            newick: String::new(),
            root,
            nodes,
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn external_nodes(&self) -> Vec<&TreeNode> {
        self.nodes.iter().filter(|node| node.is_leaf()).collect()
    }

    /// Leaves below `node_id`, found by walking the children lists.
    pub fn descendant_leaves(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![node_id];

        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.is_leaf() {
                leaves.push(current);
            } else {
                stack.extend(node.children.iter().rev().copied());
            }
        }

        leaves
    }

    fn build_nodes_from_phylo(phylo: &PhyloTree) -> Vec<TreeNode> {
        let mut nodes = Vec::with_capacity(phylo.size());
        for idx in 0..phylo.size() {
            match phylo.get(&idx) {
                Ok(node) => nodes.push(TreeNode::from_phylo(node)),
                Err(_) => nodes.push(TreeNode::new(idx, None, None)),
            }
        }
        nodes
    }
}

/// Node within a phylogenetic tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: Option<String>,
    pub length: Option<f64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn new(id: NodeId, name: Option<String>, length: Option<f64>) -> Self {
        Self {
            id,
            name,
            length,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn from_phylo(node: &PhyloNode) -> Self {
        let name = node.name.clone().filter(|name| !name.is_empty());
        let mut tree_node = TreeNode::new(node.id, name, node.parent_edge);
        tree_node.parent = node.parent;
        tree_node.children = node.children.clone();
        tree_node
    }
}

/// Container for the full contents of an imported file.
#[derive(Debug, Clone)]
pub struct TreeBundle {
    pub format: TreeFileFormat,
    pub trees: Vec<Tree>,
}

impl TreeBundle {
    pub fn new(format: TreeFileFormat, trees: Vec<Tree>) -> Self {
        Self { format, trees }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TreeFileFormat {
    Newick,
    Nexus,
}

/// Build a tree from `(name, parent)` pairs; index 0 must be the root.
#[cfg(test)]
pub(crate) fn tree_from_parents(entries: &[(&str, Option<NodeId>)]) -> Tree {
    let mut nodes: Vec<TreeNode> = entries
        .iter()
        .enumerate()
        .map(|(id, (name, _))| {
            let name = (!name.is_empty()).then(|| name.to_string());
            TreeNode::new(id, name, Some(1.0))
        })
        .collect();

    for (id, (_, parent)) in entries.iter().enumerate() {
        if let Some(parent_id) = parent {
            nodes[id].parent = Some(*parent_id);
            nodes[*parent_id].children.push(id);
        }
    }
    nodes[0].length = None;

    Tree::from_nodes(0, Some("test".to_string()), nodes)
}

/// A ladder of `depth` internal nodes, each with one tip and one deeper node.
#[cfg(test)]
pub(crate) fn caterpillar(depth: usize) -> Tree {
    let mut nodes = vec![TreeNode::new(0, None, None)];
    let mut spine = 0;
    for step in 0..depth {
        let tip = nodes.len();
        let next = tip + 1;

        let mut leaf = TreeNode::new(tip, Some(format!("t{step}")), Some(1.0));
        leaf.parent = Some(spine);
        let mut inner = TreeNode::new(next, None, Some(1.0));
        inner.parent = Some(spine);

        nodes[spine].children = vec![tip, next];
        nodes.push(leaf);
        nodes.push(inner);
        spine = next;
    }
    nodes[spine].name = Some("end".to_string());

    Tree::from_nodes(0, None, nodes)
}

/// The four-leaf tree used across the panel tests:
///
/// ```text
///        R
///       / \
///      Y   D
///     / \
///    A   X
///       / \
///      B   C
/// ```
#[cfg(test)]
pub(crate) fn sample_tree() -> Tree {
    tree_from_parents(&[
        ("R", None),
        ("Y", Some(0)),
        ("D", Some(0)),
        ("A", Some(1)),
        ("X", Some(1)),
        ("B", Some(4)),
        ("C", Some(4)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_nodes_finds_root() {
        let tree = sample_tree();
        assert_eq!(tree.root, Some(0));
        assert_eq!(tree.leaf_count(), 4);
    }

    #[test]
    fn descendant_leaves_keep_child_order() {
        let tree = sample_tree();
        let names: Vec<_> = tree
            .descendant_leaves(1)
            .into_iter()
            .filter_map(|id| tree.nodes[id].name.clone())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(tree.descendant_leaves(3), vec![3]);
    }
}
