mod forces;
mod quadtree;

use std::collections::HashMap;
use std::time::Instant;

use crate::geometry::{Position, pos};
use crate::graph::Graph;
use crate::util::stable_pair;

use super::config::ForceDirectedLayout;
use super::task::StopStatus;
use forces::{RepulsionParams, accumulate_repulsion_for_node, fallback_direction};
use quadtree::QuadNode;

const SOFTENING: f64 = 620.0;

struct Spring {
    from: usize,
    to: usize,
    length: f64,
}

/// Force-directed simulation over a snapshot of the visible elements.
///
/// Results are written back by node id, so nodes removed from the graph while
/// the simulation runs are skipped rather than resurrected.
pub(super) struct ForceSimulation {
    config: ForceDirectedLayout,
    ids: Vec<String>,
    positions: Vec<Position>,
    velocities: Vec<Position>,
    masses: Vec<f64>,
    springs: Vec<Spring>,
    iterations: usize,
    started: Instant,
}

impl ForceSimulation {
    pub(super) fn new(graph: &Graph, config: ForceDirectedLayout) -> Self {
        let visible = graph.visible_nodes().collect::<Vec<_>>();
        let n = visible.len();

        let index_by_id = visible
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect::<HashMap<_, _>>();

        let base_radius = (n as f64).sqrt() * config.spring_length * 0.5;
        let positions = visible
            .iter()
            .enumerate()
            .map(|(index, node)| {
                if !config.randomize {
                    return node.position;
                }
                let angle = (index as f64 / n.max(1) as f64) * std::f64::consts::TAU;
                let (jx, jy) = stable_pair(&node.id);
                let jitter = pos(jx, jy) * (config.spring_length * 0.2);
                pos(angle.cos(), angle.sin()) * base_radius + jitter
            })
            .collect::<Vec<_>>();

        let masses = visible
            .iter()
            .map(|node| node.mass.unwrap_or(config.mass).max(0.001))
            .collect::<Vec<_>>();

        let springs = graph
            .visible_edges()
            .filter_map(|edge| {
                let from = *index_by_id.get(edge.source.as_str())?;
                let to = *index_by_id.get(edge.target.as_str())?;
                (from != to).then(|| Spring {
                    from,
                    to,
                    length: edge.spring_length.unwrap_or(config.spring_length),
                })
            })
            .collect::<Vec<_>>();

        Self {
            ids: visible.iter().map(|node| node.id.clone()).collect(),
            velocities: vec![Position::ZERO; n],
            positions,
            masses,
            springs,
            iterations: 0,
            started: Instant::now(),
            config,
        }
    }

    pub(super) fn iterations(&self) -> usize {
        self.iterations
    }

    /// Runs one refresh worth of iterations (or everything when not animated)
    /// and writes the positions back.
    pub(super) fn advance(&mut self, graph: &mut Graph) -> Option<StopStatus> {
        let budget = if self.config.animate {
            self.config.refresh.max(1)
        } else {
            usize::MAX
        };

        let mut status = None;
        for _ in 0..budget {
            status = if self.ids.is_empty() {
                Some(StopStatus::Converged)
            } else {
                let movement = self.tick();
                self.iterations += 1;
                self.stop_condition(movement)
            };
            if status.is_some() {
                break;
            }
        }

        if self.config.animate || status.is_some() {
            self.write_back(graph);
        }
        if status.is_some() && self.config.fit {
            graph.fit_visible();
        }
        status
    }

    fn stop_condition(&self, movement: f64) -> Option<StopStatus> {
        if movement < self.config.movement_threshold {
            Some(StopStatus::Converged)
        } else if self.iterations >= self.config.max_iterations {
            Some(StopStatus::IterationLimit)
        } else if self.started.elapsed() >= self.config.max_simulation_time {
            Some(StopStatus::TimeLimit)
        } else {
            None
        }
    }

    /// One integration step. Returns the average distance moved.
    fn tick(&mut self) -> f64 {
        let n = self.positions.len();
        let mut forces = vec![Position::ZERO; n];

        let params = RepulsionParams {
            strength: -self.config.gravity,
            softening: SOFTENING,
            theta: self.config.theta,
        };
        if let Some(tree) = QuadNode::build(&self.positions, &self.masses) {
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_repulsion_for_node(
                    &tree,
                    index,
                    &self.positions,
                    &self.masses,
                    params,
                    force,
                );
            }
        }

        for spring in &self.springs {
            let delta = self.positions[spring.from] - self.positions[spring.to];
            let distance = delta.length();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                fallback_direction(spring.from, spring.to)
            };

            let correction = direction * ((distance - spring.length) * self.config.spring_coeff);
            forces[spring.from] -= correction;
            forces[spring.to] += correction;
        }

        let friction = (1.0 - self.config.drag).clamp(0.0, 1.0);
        let max_speed = self.config.spring_length.max(1.0);
        let mut movement = 0.0;
        for (index, force) in forces.into_iter().enumerate() {
            let force = force - self.positions[index] * self.config.pull;
            let mut velocity = (self.velocities[index]
                + force * (self.config.time_step / self.masses[index]))
                * friction;

            let speed = velocity.length();
            if speed > max_speed {
                velocity *= max_speed / speed;
            }
            if !velocity.is_finite() {
                velocity = Position::ZERO;
            }

            self.velocities[index] = velocity;
            self.positions[index] += velocity;
            movement += velocity.length();
        }

        movement / n as f64
    }

    fn write_back(&self, graph: &mut Graph) {
        graph.batch(|graph| {
            for (id, position) in self.ids.iter().zip(&self.positions) {
                graph.set_position(id, *position);
            }
        });
    }
}
