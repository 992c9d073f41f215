//! Layout computation and caching.
//!
//! Force-directed layouts of a few thousand nodes are slow, so finished
//! layouts are stored under a key derived from the layout algorithm and the
//! loaded subontologies, and reused as long as they still cover the graph.

pub mod config;
mod key;
mod matcher;
mod orchestrator;
mod physics;
mod runner;
mod scheduler;
mod store;
mod task;

pub use config::{ForceDirectedLayout, GridLayout, LayoutConfig, PresetLayout};
pub use key::derive_key;
pub use matcher::{LayoutMatcher, MatchDecision, MatchReport, MatchThresholds};
pub use orchestrator::{CacheOrchestrator, CacheOutcome};
pub use runner::{LayoutRunner, LayoutStop, VIRTUAL_NODE_MASS, VIRTUAL_SPRING_LENGTH, positions};
pub use scheduler::LayoutId;
pub use store::{FileStore, KeyValueStore, MemoryStore, PositionList, PositionStore};
pub use task::StopStatus;
