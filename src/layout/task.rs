use std::fmt;

use crate::geometry::{Position, pos};
use crate::graph::Graph;

use super::config::{GridLayout, LayoutConfig, PresetLayout};
use super::physics::ForceSimulation;

/// Why a computation stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopStatus {
    Converged,
    IterationLimit,
    TimeLimit,
    Placed,
    Cancelled,
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Converged => "converged",
            Self::IterationLimit => "iteration limit",
            Self::TimeLimit => "time limit",
            Self::Placed => "placed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// One-shot placement computed up front and applied on the first step.
pub(super) struct Placement {
    positions: Vec<(String, Position)>,
    fit: bool,
}

impl Placement {
    /// Covers every real node, hidden ones included, so that a cached layout
    /// leaves no stale coordinate behind.
    pub(super) fn preset(graph: &Graph, layout: &PresetLayout) -> Self {
        let positions = graph
            .nodes()
            .iter()
            .filter(|node| !node.is_virtual())
            .map(|node| {
                let position = layout
                    .positions
                    .get(&node.id)
                    .copied()
                    .unwrap_or(layout.fallback);
                (node.id.clone(), position)
            })
            .collect();

        Self {
            positions,
            fit: layout.fit,
        }
    }

    pub(super) fn grid(graph: &Graph, layout: &GridLayout) -> Self {
        let ids = graph
            .visible_nodes()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        let columns = (ids.len() as f64).sqrt().ceil().max(1.0) as usize;
        let rows = ids.len().div_ceil(columns);
        let offset = pos(
            (columns.saturating_sub(1)) as f64 * layout.spacing * 0.5,
            (rows.saturating_sub(1)) as f64 * layout.spacing * 0.5,
        );

        let positions = ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| {
                let cell = pos((index % columns) as f64, (index / columns) as f64);
                (id, cell * layout.spacing - offset)
            })
            .collect();

        Self {
            positions,
            fit: layout.fit,
        }
    }

    fn apply(&self, graph: &mut Graph) {
        graph.batch(|graph| {
            for (id, position) in &self.positions {
                graph.set_position(id, *position);
            }
        });
        if self.fit {
            graph.fit_visible();
        }
    }
}

pub(super) enum LayoutTask {
    Simulation(Box<ForceSimulation>),
    Placement(Placement),
}

impl LayoutTask {
    pub(super) fn new(graph: &Graph, config: &LayoutConfig) -> Self {
        match config {
            LayoutConfig::Preset(layout) => Self::Placement(Placement::preset(graph, layout)),
            LayoutConfig::Grid(layout) => Self::Placement(Placement::grid(graph, layout)),
            LayoutConfig::ForceDirected(layout) => {
                Self::Simulation(Box::new(ForceSimulation::new(graph, layout.clone())))
            }
        }
    }

    pub(super) fn advance(&mut self, graph: &mut Graph) -> Option<StopStatus> {
        match self {
            Self::Simulation(simulation) => simulation.advance(graph),
            Self::Placement(placement) => {
                placement.apply(graph);
                Some(StopStatus::Placed)
            }
        }
    }

    pub(super) fn iterations(&self) -> usize {
        match self {
            Self::Simulation(simulation) => simulation.iterations(),
            Self::Placement(_) => 0,
        }
    }
}
