use crate::geometry::{Position, pos};

use super::quadtree::QuadNode;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f64,
    pub(super) softening: f64,
    pub(super) theta: f64,
}

/// Direction used when two bodies sit on top of each other.
pub(super) fn fallback_direction(from: usize, to: usize) -> Position {
    let angle = ((from as f64) * 0.618_034 + (to as f64) * 0.414_214) * std::f64::consts::TAU;
    pos(angle.cos(), angle.sin())
}

fn repulsion_between(
    point_a: Position,
    point_b: Position,
    mass_product: f64,
    params: RepulsionParams,
    tie_break: (usize, usize),
) -> Position {
    let delta = point_a - point_b;
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        fallback_direction(tie_break.0, tie_break.1)
    };
    direction * (params.strength * mass_product / (distance_sq + params.softening))
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Position],
    masses: &[f64],
    params: RepulsionParams,
    force: &mut Position,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    let own_mass = masses[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += repulsion_between(
                point,
                positions[other_index],
                own_mass * masses[other_index],
                params,
                (index, other_index),
            );
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate =
        !node.bounds.contains(point) && ((node.bounds.side_length() / distance) < params.theta);

    if can_approximate {
        let direction = delta / distance;
        let scaled = (params.strength * own_mass * node.mass) / (distance_sq + params.softening);
        *force += direction * scaled;
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, masses, params, force);
    }
}
