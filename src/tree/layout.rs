use std::fmt;

use super::traversal::TraversalIndex;
use super::{NodeId, Tree};

mod circular;
mod rectangular;
mod unrooted;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    Rectangular,
    Circular,
    Unrooted,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 3] = [
        LayoutKind::Rectangular,
        LayoutKind::Circular,
        LayoutKind::Unrooted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutKind::Rectangular => "Rectangular",
            LayoutKind::Circular => "Circular",
            LayoutKind::Unrooted => "Unrooted",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Layouts drawn around a center rather than left to right.
    pub fn is_radial(self) -> bool {
        !matches!(self, LayoutKind::Rectangular)
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Node coordinates in layout space, shifted so the bounding box starts at the origin.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub positions: Vec<(f32, f32)>,
    pub edges: Vec<(NodeId, NodeId)>,
    pub width: f32,
    pub height: f32,
    pub leaf_count: usize,
    pub kind: LayoutKind,
}

pub(super) const DEFAULT_BRANCH_LENGTH: f32 = 1.0;

impl TreeLayout {
    pub fn from_tree(tree: &Tree, kind: LayoutKind) -> Option<Self> {
        tree.root?;
        let index = TraversalIndex::new(tree);
        let postorder = index.postorder_nodes();
        let mut positions = match kind {
            LayoutKind::Rectangular => rectangular::positions(tree, postorder),
            LayoutKind::Circular => circular::positions(tree, postorder),
            LayoutKind::Unrooted => unrooted::positions(tree, postorder),
        };
        let (width, height) = normalize_positions(&mut positions);

        let edges = tree
            .nodes
            .iter()
            .filter_map(|node| node.parent.map(|parent| (parent, node.id)))
            .collect();

        Some(Self {
            positions,
            edges,
            width,
            height,
            leaf_count: tree.leaf_count().max(1),
            kind,
        })
    }

    pub fn position(&self, node_id: NodeId) -> Option<(f32, f32)> {
        self.positions.get(node_id).copied()
    }
}

pub(super) fn branch_length(tree: &Tree, node_id: NodeId) -> f32 {
    tree.nodes[node_id]
        .length
        .map(|value| value as f32)
        .unwrap_or(DEFAULT_BRANCH_LENGTH)
}

fn normalize_positions(positions: &mut [(f32, f32)]) -> (f32, f32) {
    if positions.is_empty() {
        return (1.0, 1.0);
    }

    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for &(x, y) in positions.iter() {
        if x.is_finite() {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
        }
        if y.is_finite() {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if !min_x.is_finite() || !min_y.is_finite() {
        return (1.0, 1.0);
    }

    for (x, y) in positions.iter_mut() {
        *x -= min_x;
        *y -= min_y;
    }

    ((max_x - min_x).max(1e-6), (max_y - min_y).max(1e-6))
}
