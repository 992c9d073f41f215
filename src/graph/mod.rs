mod build;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::GraphError;
use crate::geometry::{Bounds, Position};

pub use build::{edge_from_property, node_from_class};

/// Attribute holding the subontology a node was loaded from.
pub const PREFIX: &str = "prefix";
/// Attribute marking synthetic elements.
pub const TYPE: &str = "type";
pub const VIRTUAL: &str = "virtual";

#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub position: Position,
    pub visible: bool,
    pub mass: Option<f64>,
    pub labels: BTreeMap<String, Vec<String>>,
    pub data: HashMap<String, String>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: Position::ZERO,
            visible: true,
            mass: None,
            labels: BTreeMap::new(),
            data: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.attr(PREFIX).filter(|prefix| !prefix.is_empty())
    }

    pub fn is_virtual(&self) -> bool {
        self.attr(TYPE) == Some(VIRTUAL)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub visible: bool,
    pub spring_length: Option<f64>,
    pub data: HashMap<String, String>,
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            visible: true,
            spring_length: None,
            data: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_spring_length(mut self, length: f64) -> Self {
        self.spring_length = Some(length);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// In-memory model of the rendered graph.
///
/// Layout code only reads and writes node positions and adds or removes its
/// own synthetic elements; everything else (visibility, attributes) belongs
/// to whoever loaded the graph.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    index_by_id: HashMap<String, usize>,
    batch_depth: usize,
    revision: u64,
    viewport: Option<Bounds>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.node(id).map(|node| node.position)
    }

    pub fn set_position(&mut self, id: &str, position: Position) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.nodes[index].position = position;
        self.touch();
        true
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.nodes[index].visible = visible;
        self.touch();
        true
    }

    pub fn add_node(&mut self, node: NodeRecord) -> Result<(), GraphError> {
        if self.index_by_id.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }

        self.index_by_id.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.touch();
        Ok(())
    }

    pub fn add_edge(&mut self, edge: EdgeRecord) -> Result<(), GraphError> {
        if !self.contains(&edge.source) || !self.contains(&edge.target) {
            return Err(GraphError::MissingEndpoint {
                from: edge.source,
                to: edge.target,
            });
        }

        self.edges.push(edge);
        self.touch();
        Ok(())
    }

    /// Removes every matching node together with its incident edges.
    pub fn remove_nodes_where(&mut self, mut predicate: impl FnMut(&NodeRecord) -> bool) -> usize {
        let removed = self
            .nodes
            .iter()
            .filter(|node| predicate(node))
            .map(|node| node.id.clone())
            .collect::<HashSet<_>>();
        if removed.is_empty() {
            return 0;
        }

        self.nodes.retain(|node| !removed.contains(&node.id));
        self.edges
            .retain(|edge| !removed.contains(&edge.source) && !removed.contains(&edge.target));
        self.index_by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        self.touch();
        removed.len()
    }

    pub fn is_edge_visible(&self, edge: &EdgeRecord) -> bool {
        edge.visible
            && self.node(&edge.source).is_some_and(|node| node.visible)
            && self.node(&edge.target).is_some_and(|node| node.visible)
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter().filter(|node| node.visible)
    }

    pub fn visible_edges(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.edges.iter().filter(|edge| self.is_edge_visible(edge))
    }

    /// Coalesces all changes made inside `update` into a single revision.
    pub fn batch<R>(&mut self, update: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = update(self);
        self.batch_depth -= 1;
        self.touch();
        result
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    pub fn fit_visible(&mut self) {
        self.viewport = Bounds::from_points(self.visible_nodes().map(|node| node.position));
    }

    fn touch(&mut self) {
        if self.batch_depth == 0 {
            self.revision = self.revision.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::pos;

    fn triangle() -> Graph {
        let mut graph = Graph::new();
        for id in ["a", "b", "c"] {
            graph.add_node(NodeRecord::new(id)).expect("unique ids");
        }
        graph.add_edge(EdgeRecord::new("a", "b")).expect("endpoints exist");
        graph.add_edge(EdgeRecord::new("b", "c")).expect("endpoints exist");
        graph.add_edge(EdgeRecord::new("c", "a")).expect("endpoints exist");
        graph
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let mut graph = triangle();
        assert_eq!(
            graph.add_node(NodeRecord::new("a")),
            Err(GraphError::DuplicateNode("a".to_owned()))
        );
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn edges_need_both_endpoints() {
        let mut graph = triangle();
        assert!(matches!(
            graph.add_edge(EdgeRecord::new("a", "zzz")),
            Err(GraphError::MissingEndpoint { .. })
        ));
    }

    #[test]
    fn removing_nodes_drops_incident_edges_and_reindexes() {
        let mut graph = triangle();
        graph.set_position("c", pos(7.0, 8.0));

        let removed = graph.remove_nodes_where(|node| node.id == "a");

        assert_eq!(removed, 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.position("c"), Some(pos(7.0, 8.0)));
        assert!(!graph.contains("a"));
    }

    #[test]
    fn hidden_endpoint_hides_edge() {
        let mut graph = triangle();
        graph.set_visible("b", false);
        assert_eq!(graph.visible_nodes().count(), 2);
        assert_eq!(graph.visible_edges().count(), 1);
    }

    #[test]
    fn batch_bumps_revision_once() {
        let mut graph = triangle();
        let before = graph.revision();
        graph.batch(|graph| {
            graph.set_position("a", pos(1.0, 1.0));
            graph.set_position("b", pos(2.0, 2.0));
        });
        assert_eq!(graph.revision(), before + 1);
    }

    #[test]
    fn fit_covers_visible_nodes_only() {
        let mut graph = triangle();
        graph.set_position("a", pos(-10.0, 0.0));
        graph.set_position("b", pos(10.0, 5.0));
        graph.set_position("c", pos(100.0, 100.0));
        graph.set_visible("c", false);

        graph.fit_visible();

        let viewport = graph.viewport().expect("visible nodes");
        assert_eq!(viewport.min, pos(-10.0, 0.0));
        assert_eq!(viewport.max, pos(10.0, 5.0));
    }
}
