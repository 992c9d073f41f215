use log::{info, warn};

use crate::sparql::Binding;
use crate::util::local_name;

use super::{EdgeRecord, Graph, NodeRecord};

/// Builds a node from one row of the class query. Rows without `id` are dropped.
pub fn node_from_class(binding: &Binding) -> Option<NodeRecord> {
    let id = binding.get("id").map(|value| value.value.trim())?;
    if id.is_empty() {
        return None;
    }

    let mut node = NodeRecord::new(id);
    for (variable, value) in binding {
        match variable.as_str() {
            "id" => {}
            "l" => {
                for label in value.value.split('|').filter(|label| !label.is_empty()) {
                    let (text, tag) = label.rsplit_once('@').unwrap_or((label, ""));
                    node.labels
                        .entry(tag.to_string())
                        .or_default()
                        .push(text.to_string());
                }
            }
            _ => {
                node.data.insert(variable.clone(), value.value.clone());
            }
        }
    }

    Some(node)
}

/// Builds an edge from one row of the property query.
pub fn edge_from_property(binding: &Binding, index: usize) -> Option<EdgeRecord> {
    let source = binding.get("c")?;
    let target = binding.get("d")?;
    let property = binding.get("p")?;

    let mut edge = EdgeRecord::new(source.value.as_str(), target.value.as_str())
        .with_attr("id", index.to_string())
        .with_attr("p", property.value.as_str())
        .with_attr("pl", local_name(&property.value));
    if let Some(graph) = binding.get("g") {
        edge = edge.with_attr("g", graph.value.as_str());
    }
    if let Some(axiom) = binding.get("ax") {
        edge = edge.with_attr("ax", axiom.value.as_str());
    }

    Some(edge)
}

impl Graph {
    pub fn from_bindings(classes: &[Binding], properties: &[Binding]) -> Self {
        let mut graph = Self::new();

        graph.batch(|graph| {
            let mut duplicates = 0usize;
            for node in classes.iter().filter_map(node_from_class) {
                if graph.add_node(node).is_err() {
                    duplicates += 1;
                }
            }
            if duplicates > 0 {
                warn!("Skipped {duplicates} duplicate class bindings.");
            }
            info!("{} nodes loaded", graph.node_count());

            let mut dangling = 0usize;
            for (index, binding) in properties.iter().enumerate() {
                let Some(edge) = edge_from_property(binding, index) else {
                    dangling += 1;
                    continue;
                };
                if graph.add_edge(edge).is_err() {
                    dangling += 1;
                }
            }
            if dangling > 0 {
                warn!("Skipped {dangling} property bindings with unknown or missing endpoints.");
            }
            info!("{} edges loaded", graph.edge_count());
        });

        graph
    }
}
