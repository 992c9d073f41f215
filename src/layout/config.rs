use std::collections::HashMap;
use std::time::Duration;

use crate::geometry::Position;

pub const DEFAULT_SPRING_LENGTH: f64 = 800.0;
pub const DEFAULT_NODE_MASS: f64 = 40.0;

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutConfig {
    Preset(PresetLayout),
    Grid(GridLayout),
    ForceDirected(ForceDirectedLayout),
}

impl LayoutConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Preset(_) => "preset",
            Self::Grid(_) => "grid",
            Self::ForceDirected(layout) => &layout.name,
        }
    }
}

/// Places every node at an explicitly supplied coordinate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PresetLayout {
    pub positions: HashMap<String, Position>,
    pub fallback: Position,
    pub fit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    pub spacing: f64,
    pub fit: bool,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            spacing: 120.0,
            fit: true,
        }
    }
}

/// Iterative spring-electrical simulation.
///
/// `spring_length` and `mass` are defaults; edges with their own spring
/// length and nodes with their own mass override them.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceDirectedLayout {
    pub name: String,
    pub spring_length: f64,
    pub spring_coeff: f64,
    pub mass: f64,
    pub gravity: f64,
    pub pull: f64,
    pub theta: f64,
    pub drag: f64,
    pub time_step: f64,
    pub movement_threshold: f64,
    pub max_iterations: usize,
    pub max_simulation_time: Duration,
    pub randomize: bool,
    pub animate: bool,
    pub refresh: usize,
    pub fit: bool,
}

impl Default for ForceDirectedLayout {
    fn default() -> Self {
        Self {
            name: "euler".to_owned(),
            spring_length: DEFAULT_SPRING_LENGTH,
            spring_coeff: 0.0008,
            mass: DEFAULT_NODE_MASS,
            gravity: -1.2,
            pull: 0.001,
            theta: 0.666,
            drag: 0.1,
            time_step: 80.0,
            movement_threshold: 1.0,
            max_iterations: 500,
            max_simulation_time: Duration::from_secs(40),
            randomize: true,
            animate: true,
            refresh: 50,
            fit: true,
        }
    }
}

/// Very fast but useless for most purposes except testing.
pub fn grid() -> LayoutConfig {
    LayoutConfig::Grid(GridLayout::default())
}

/// The force-directed default used after loading.
pub fn euler() -> LayoutConfig {
    LayoutConfig::ForceDirected(ForceDirectedLayout::default())
}

pub fn euler_tight() -> LayoutConfig {
    euler_variable(40.0)
}

pub fn euler_variable(spring_length: f64) -> LayoutConfig {
    LayoutConfig::ForceDirected(ForceDirectedLayout {
        spring_length,
        animate: false,
        randomize: false,
        ..ForceDirectedLayout::default()
    })
}
