use std::f32::consts::TAU;

use super::branch_length;
use crate::tree::{NodeId, Tree};

/// Equal-angle layout: each subtree gets a wedge proportional to its tip count
/// and every branch points through the middle of its wedge.
pub(super) fn positions(tree: &Tree, postorder: &[NodeId]) -> Vec<(f32, f32)> {
    let count = tree.nodes.len();
    let mut positions = vec![(0.0f32, 0.0f32); count];

    let mut tips = vec![0usize; count];
    for &node_id in postorder {
        let children = &tree.nodes[node_id].children;
        tips[node_id] = if children.is_empty() {
            1
        } else {
            children.iter().map(|&child_id| tips[child_id]).sum()
        };
    }

    // (start angle, span) of each node's wedge; the root owns the full turn.
    let mut wedges = vec![(0.0f32, TAU); count];
    for &node_id in postorder.iter().rev() {
        let origin = positions[node_id];
        let (mut wedge_start, span) = wedges[node_id];
        let total = tips[node_id].max(1) as f32;

        for &child_id in &tree.nodes[node_id].children {
            let wedge = span * tips[child_id].max(1) as f32 / total;
            let direction = wedge_start + wedge / 2.0;
            let length = branch_length(tree, child_id);
            positions[child_id] = (
                origin.0 + length * direction.cos(),
                origin.1 + length * direction.sin(),
            );
            wedges[child_id] = (wedge_start, wedge);
            wedge_start += wedge;
        }
    }

    positions
}
