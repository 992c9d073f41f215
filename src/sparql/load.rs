use anyhow::{Context, Result};
use log::info;

use crate::config::Config;
use crate::graph::Graph;
use crate::util::Timer;

use super::Binding;

/// Executes SELECT queries against an endpoint.
pub trait SparqlTransport {
    fn select(&self, query: &str) -> Result<Vec<Binding>>;
}

/// Loads the configured subontologies and helper graphs into a fresh graph.
pub fn load_graph(transport: &dyn SparqlTransport, config: &Config) -> Result<Graph> {
    let class_timer = Timer::start("sparql-classes");
    let classes = transport
        .select(&config.class_query())
        .context("failed to load classes")?;
    class_timer.stop(Some(&format!("{} classes", classes.len())));

    let property_timer = Timer::start("sparql-properties");
    let properties = transport
        .select(&config.property_query())
        .context("failed to load properties")?;
    property_timer.stop(Some(&format!("{} properties", properties.len())));

    let graph = Graph::from_bindings(&classes, &properties);
    info!(
        "Loaded {} nodes and {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        config.sparql_endpoint
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use anyhow::anyhow;

    use super::*;
    use crate::sparql::BindingValue;

    struct Recorded {
        queries: RefCell<Vec<String>>,
        fail_properties: bool,
    }

    impl SparqlTransport for Recorded {
        fn select(&self, query: &str) -> Result<Vec<Binding>> {
            self.queries.borrow_mut().push(query.to_owned());
            if query.contains("owl:Class ^a") {
                if self.fail_properties {
                    return Err(anyhow!("endpoint timed out"));
                }
                let row = [("c", "a"), ("d", "b"), ("p", "http://x/meta/updates")]
                    .into_iter()
                    .map(|(key, value)| (key.to_owned(), BindingValue::uri(value)))
                    .collect();
                return Ok(vec![row]);
            }
            Ok(["a", "b"]
                .into_iter()
                .map(|id| [("id".to_owned(), BindingValue::uri(id))].into_iter().collect())
                .collect())
        }
    }

    #[test]
    fn runs_class_then_property_query() {
        let transport = Recorded {
            queries: RefCell::new(Vec::new()),
            fail_properties: false,
        };

        let graph = load_graph(&transport, &Config::default()).expect("load");

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let queries = transport.queries.borrow();
        assert_eq!(queries.len(), 2);
        assert!(queries[0].contains("?id a owl:Class"));
    }

    #[test]
    fn transport_failure_propagates() {
        let transport = Recorded {
            queries: RefCell::new(Vec::new()),
            fail_properties: true,
        };

        let error = load_graph(&transport, &Config::default()).expect_err("must fail");
        assert!(error.to_string().contains("failed to load properties"));
    }
}
