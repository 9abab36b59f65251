use std::f32::consts::TAU;

use super::branch_length;
use crate::tree::{NodeId, Tree};

/// Tips are spread evenly around the circle; the radius is the distance from
/// the root and internal nodes take the mean angle of their outer children.
pub(super) fn positions(tree: &Tree, postorder: &[NodeId]) -> Vec<(f32, f32)> {
    let count = tree.nodes.len();
    let tip_count = tree.leaf_count().max(1) as f32;

    let mut angles = vec![0.0f32; count];
    let mut next_tip = 0usize;
    for &node_id in postorder {
        let children = &tree.nodes[node_id].children;
        angles[node_id] = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => (angles[first] + angles[last]) / 2.0,
            _ => {
                let angle = TAU * next_tip as f32 / tip_count;
                next_tip += 1;
                angle
            }
        };
    }

    let mut radii = vec![0.0f32; count];
    for &node_id in postorder.iter().rev() {
        for &child_id in &tree.nodes[node_id].children {
            radii[child_id] = radii[node_id] + branch_length(tree, child_id);
        }
    }

    angles
        .iter()
        .zip(&radii)
        .map(|(angle, radius)| (radius * angle.cos(), radius * angle.sin()))
        .collect()
}
