use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::GraphError;
use crate::geometry::Position;
use crate::graph::{EdgeRecord, Graph, NodeRecord, TYPE, VIRTUAL};

use super::config::{LayoutConfig, PresetLayout};
use super::key::derive_key;
use super::scheduler::{Finished, LayoutId, LayoutScheduler};
use super::store::{PositionList, PositionStore};
use super::task::{LayoutTask, StopStatus};

/// Mass of the per-subontology anchor nodes; regular nodes default to 40.
pub const VIRTUAL_NODE_MASS: f64 = 400.0;
/// Spring length between a node and its subontology anchor.
pub const VIRTUAL_SPRING_LENGTH: f64 = 180.0;

/// Record of a computation that completed or was cancelled.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutStop {
    pub id: LayoutId,
    pub layout: String,
    pub status: StopStatus,
    pub iterations: usize,
    pub elapsed: Duration,
    pub persisted: bool,
}

struct Completion {
    virtual_nodes: bool,
    persist_key: Option<String>,
}

/// Node ids paired with their current coordinates.
pub fn positions<'a>(nodes: impl IntoIterator<Item = &'a NodeRecord>) -> PositionList {
    nodes
        .into_iter()
        .map(|node| (node.id.clone(), node.position))
        .collect()
}

/// Runs layout computations over the visible part of a graph and writes
/// finished layouts to the [`PositionStore`].
pub struct LayoutRunner {
    scheduler: LayoutScheduler<Completion>,
    store: PositionStore,
    stops: Vec<LayoutStop>,
}

impl LayoutRunner {
    pub fn new(store: PositionStore) -> Self {
        Self {
            scheduler: LayoutScheduler::new(),
            store,
            stops: Vec::new(),
        }
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PositionStore {
        &mut self.store
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn active_layout(&self) -> Option<LayoutId> {
        self.scheduler.active_id()
    }

    /// Starts a layout of the visible elements.
    ///
    /// Returns `Ok(false)` without touching the graph or the running
    /// computation when nothing is visible. The computation itself advances
    /// through [`step`](Self::step) or [`finish`](Self::finish); the layout is
    /// persisted when it stops, provided `subs` is given and `persist` is set.
    pub fn run(
        &mut self,
        graph: &mut Graph,
        config: &LayoutConfig,
        subs: Option<&BTreeSet<String>>,
        separate_subs: bool,
        persist: bool,
    ) -> Result<bool, GraphError> {
        if !graph.visible_nodes().any(|node| !node.is_virtual()) {
            warn!("Graph empty. Nothing to layout.");
            return Ok(false);
        }

        // The previous computation's cleanup removes virtual nodes by marker,
        // so it has to run before this pass adds its own.
        if let Some(cancelled) = self.scheduler.cancel_current() {
            self.complete(graph, cancelled);
        }

        let virtual_nodes = match subs {
            Some(subs) if separate_subs => {
                info!("Separate subontologies checked");
                add_virtual_elements(graph, subs)?;
                true
            }
            _ => {
                info!("Separate subontologies unchecked");
                false
            }
        };

        let persist_key = subs
            .filter(|_| persist)
            .map(|subs| derive_key(config.name(), subs, separate_subs));
        let task = LayoutTask::new(graph, config);
        let (id, cancelled) = self.scheduler.start(
            config.name(),
            task,
            Completion {
                virtual_nodes,
                persist_key,
            },
        );
        if let Some(cancelled) = cancelled {
            self.complete(graph, cancelled);
        }

        debug!("Started {} layout {id}", config.name());
        Ok(true)
    }

    /// Places every visible node at its mapped position, or at the origin when
    /// unmapped, then fits the view. Completes before returning.
    pub fn apply_positions(
        &mut self,
        graph: &mut Graph,
        positions: HashMap<String, Position>,
    ) -> bool {
        let config = LayoutConfig::Preset(PresetLayout {
            positions,
            fallback: Position::ZERO,
            fit: true,
        });

        match self.run(graph, &config, None, false, false) {
            Ok(true) => self.finish(graph).is_some(),
            Ok(false) => false,
            Err(error) => {
                warn!("Could not apply preset layout: {error}");
                false
            }
        }
    }

    /// Advances the active computation by one step.
    pub fn step(&mut self, graph: &mut Graph) -> Option<LayoutStop> {
        let finished = self.scheduler.step(graph)?;
        Some(self.complete(graph, finished))
    }

    /// Drives the active computation until it stops.
    pub fn finish(&mut self, graph: &mut Graph) -> Option<LayoutStop> {
        while self.scheduler.is_active() {
            if let Some(stop) = self.step(graph) {
                return Some(stop);
            }
        }
        None
    }

    pub fn cancel(&mut self, graph: &mut Graph) -> Option<LayoutStop> {
        let cancelled = self.scheduler.cancel_current()?;
        Some(self.complete(graph, cancelled))
    }

    /// Drains the records of computations stopped since the last call.
    pub fn take_stops(&mut self) -> Vec<LayoutStop> {
        std::mem::take(&mut self.stops)
    }

    fn complete(&mut self, graph: &mut Graph, finished: Finished<Completion>) -> LayoutStop {
        let Completion {
            virtual_nodes,
            persist_key,
        } = finished.pending;

        if virtual_nodes {
            let removed = graph.remove_nodes_where(NodeRecord::is_virtual);
            debug!("Removed {removed} virtual nodes.");
        }

        let mut persisted = false;
        if let Some(key) = persist_key {
            match self.store.save(&key, &positions(graph.nodes())) {
                Ok(()) => {
                    info!("Replaced layout cache {key}.");
                    persisted = true;
                }
                Err(error) => warn!("Could not write layout cache {key}: {error}"),
            }
        }

        let stop = LayoutStop {
            id: finished.id,
            layout: finished.name,
            status: finished.status,
            iterations: finished.iterations,
            elapsed: finished.elapsed,
            persisted,
        };
        self.stops.push(stop.clone());
        stop
    }
}

/// Adds one heavy anchor node per subontology and a short spring from every
/// node of that subontology to it.
fn add_virtual_elements(graph: &mut Graph, subs: &BTreeSet<String>) -> Result<(), GraphError> {
    let edges = graph
        .nodes()
        .iter()
        .filter(|node| !node.is_virtual())
        .filter_map(|node| {
            let prefix = node.prefix()?;
            subs.contains(prefix).then(|| {
                EdgeRecord::new(node.id.as_str(), prefix)
                    .with_spring_length(VIRTUAL_SPRING_LENGTH)
                    .with_attr(TYPE, VIRTUAL)
            })
        })
        .collect::<Vec<_>>();

    let added = graph.batch(|graph| -> Result<(), GraphError> {
        for sub in subs {
            graph.add_node(
                NodeRecord::new(sub.as_str())
                    .with_mass(VIRTUAL_NODE_MASS)
                    .with_attr(TYPE, VIRTUAL),
            )?;
        }
        debug!("Adding {} virtual edges.", edges.len());
        for edge in edges {
            graph.add_edge(edge)?;
        }
        Ok(())
    });

    if added.is_err() {
        graph.remove_nodes_where(NodeRecord::is_virtual);
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::pos;
    use crate::graph::PREFIX;
    use crate::layout::config::{self, ForceDirectedLayout};
    use crate::layout::store::MemoryStore;

    fn subs(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn ontology() -> Graph {
        let mut graph = Graph::new();
        for (id, prefix) in [("A", "meta"), ("B", "meta"), ("C", "bb")] {
            graph
                .add_node(NodeRecord::new(id).with_attr(PREFIX, prefix))
                .expect("unique");
        }
        graph.add_edge(EdgeRecord::new("A", "C")).expect("endpoints");
        graph
    }

    fn short_euler() -> LayoutConfig {
        LayoutConfig::ForceDirected(ForceDirectedLayout {
            animate: false,
            max_iterations: 20,
            ..ForceDirectedLayout::default()
        })
    }

    fn runner() -> LayoutRunner {
        LayoutRunner::new(PositionStore::new(MemoryStore::new()))
    }

    #[test]
    fn empty_visible_graph_is_a_no_op() {
        let mut graph = ontology();
        let mut runner = runner();
        runner
            .run(&mut graph, &config::grid(), None, false, false)
            .expect("grid");
        let active = runner.active_layout();

        for id in ["A", "B", "C"] {
            graph.set_visible(id, false);
        }
        let started = runner
            .run(&mut graph, &config::grid(), None, false, false)
            .expect("no error");

        assert!(!started);
        assert_eq!(runner.active_layout(), active);
        assert!(runner.take_stops().is_empty());
    }

    #[test]
    fn virtual_elements_exist_only_while_running() {
        let mut graph = ontology();
        let mut runner = runner();
        let subs = subs(&["meta", "bb"]);

        assert!(
            runner
                .run(&mut graph, &short_euler(), Some(&subs), true, true)
                .expect("run")
        );

        let virtual_ids = graph
            .nodes()
            .iter()
            .filter(|node| node.is_virtual())
            .map(|node| node.id.as_str())
            .collect::<BTreeSet<_>>();
        assert_eq!(virtual_ids, BTreeSet::from(["bb", "meta"]));
        assert_eq!(graph.node("meta").and_then(|node| node.mass), Some(VIRTUAL_NODE_MASS));

        let virtual_edges = graph
            .edges()
            .iter()
            .filter(|edge| edge.attr(TYPE) == Some(VIRTUAL))
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .collect::<BTreeSet<_>>();
        assert_eq!(
            virtual_edges,
            BTreeSet::from([("A", "meta"), ("B", "meta"), ("C", "bb")])
        );
        assert!(
            graph
                .edges()
                .iter()
                .filter(|edge| edge.attr(TYPE) == Some(VIRTUAL))
                .all(|edge| edge.spring_length == Some(VIRTUAL_SPRING_LENGTH))
        );

        let stop = runner.finish(&mut graph).expect("stops");
        assert!(stop.persisted);
        assert!(graph.nodes().iter().all(|node| !node.is_virtual()));
        assert_eq!(graph.edge_count(), 1);

        let key = derive_key("euler", &subs, true);
        let stored = runner.store().load(&key).expect("persisted");
        let ids = stored.iter().map(|(id, _)| id.as_str()).collect::<BTreeSet<_>>();
        assert_eq!(ids, BTreeSet::from(["A", "B", "C"]));
    }

    #[test]
    fn cancellation_cleans_up_virtual_nodes() {
        let mut graph = ontology();
        let mut runner = runner();
        let subs = subs(&["meta", "bb"]);
        runner
            .run(&mut graph, &config::euler(), Some(&subs), true, false)
            .expect("run");

        let stop = runner.cancel(&mut graph).expect("was running");

        assert_eq!(stop.status, StopStatus::Cancelled);
        assert!(!stop.persisted);
        assert!(graph.nodes().iter().all(|node| !node.is_virtual()));
        assert!(!runner.is_running());
    }

    #[test]
    fn new_run_cancels_previous_before_adding_virtual_nodes() {
        let mut graph = ontology();
        let mut runner = runner();
        let subs = subs(&["meta", "bb"]);

        runner
            .run(&mut graph, &short_euler(), Some(&subs), true, true)
            .expect("first");
        runner
            .run(&mut graph, &short_euler(), Some(&subs), true, true)
            .expect("second");

        let stops = runner.take_stops();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].status, StopStatus::Cancelled);
        // The second pass still has its anchors.
        assert_eq!(graph.nodes().iter().filter(|node| node.is_virtual()).count(), 2);

        let last = runner.finish(&mut graph).expect("second stops");
        assert!(last.id > stops[0].id);
        assert_ne!(last.status, StopStatus::Cancelled);
        assert!(graph.nodes().iter().all(|node| !node.is_virtual()));
    }

    #[test]
    fn colliding_virtual_node_is_an_error_and_rolls_back() {
        let mut graph = ontology();
        graph.add_node(NodeRecord::new("bb")).expect("real node named like a sub");
        let mut runner = runner();

        let error = runner
            .run(&mut graph, &short_euler(), Some(&subs(&["meta", "bb"])), true, true)
            .expect_err("collision");

        assert_eq!(error, GraphError::DuplicateNode("bb".to_owned()));
        assert!(graph.nodes().iter().all(|node| !node.is_virtual()));
        assert!(graph.contains("bb"));
        assert!(!runner.is_running());
    }

    #[test]
    fn without_subs_nothing_is_persisted() {
        let mut graph = ontology();
        let mut runner = runner();
        runner
            .run(&mut graph, &config::grid(), None, true, true)
            .expect("run");

        let stop = runner.finish(&mut graph).expect("grid stops");
        assert_eq!(stop.status, StopStatus::Placed);
        assert!(!stop.persisted);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn failed_save_still_applies_layout() {
        let mut graph = ontology();
        let mut runner = LayoutRunner::new(PositionStore::new(MemoryStore::with_quota(8)));
        runner
            .run(&mut graph, &config::grid(), Some(&subs(&["meta"])), false, true)
            .expect("run");

        let stop = runner.finish(&mut graph).expect("grid stops");

        assert!(!stop.persisted);
        assert_ne!(graph.position("A"), graph.position("B"));
    }

    #[test]
    fn apply_positions_places_visible_nodes() {
        let mut graph = ontology();
        let mut runner = runner();
        let mapping = HashMap::from([
            ("A".to_owned(), pos(1.0, 2.0)),
            ("B".to_owned(), pos(3.0, 4.0)),
        ]);

        assert!(runner.apply_positions(&mut graph, mapping));
        assert_eq!(graph.position("A"), Some(pos(1.0, 2.0)));
        assert_eq!(graph.position("B"), Some(pos(3.0, 4.0)));
        assert_eq!(graph.position("C"), Some(Position::ZERO));
        assert!(!runner.is_running());
    }

    #[test]
    fn positions_pairs_ids_with_coordinates() {
        let mut graph = ontology();
        graph.set_position("B", pos(-1.0, 9.0));
        let list = positions(graph.nodes());
        assert_eq!(list.len(), 3);
        assert!(list.contains(&("B".to_owned(), pos(-1.0, 9.0))));
    }
}
