use super::branch_length;
use crate::tree::{NodeId, Tree};

/// Tips take consecutive rows in drawing order; internal nodes sit halfway
/// between their outermost children. `x` is the distance from the root.
pub(super) fn positions(tree: &Tree, postorder: &[NodeId]) -> Vec<(f32, f32)> {
    let mut positions = vec![(0.0f32, 0.0f32); tree.nodes.len()];

    // Rows bottom-up: postorder meets tips in drawing order.
    let mut next_row = 0usize;
    for &node_id in postorder {
        let children = &tree.nodes[node_id].children;
        positions[node_id].1 = if children.is_empty() {
            let row = next_row as f32;
            next_row += 1;
            row
        } else {
            let (first_y, last_y) = children.iter().fold(
                (f32::MAX, f32::MIN),
                |(low, high), &child_id| {
                    let y = positions[child_id].1;
                    (low.min(y), high.max(y))
                },
            );
            (first_y + last_y) / 2.0
        };
    }

    // Depth top-down: reversed postorder visits parents before children.
    for &node_id in postorder.iter().rev() {
        let x = positions[node_id].0;
        for &child_id in &tree.nodes[node_id].children {
            positions[child_id].0 = x + branch_length(tree, child_id);
        }
    }

    positions
}
