pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod sparql;
pub mod util;

pub use config::Config;
pub use error::{GraphError, StoreError};
pub use geometry::{Bounds, Position};
pub use graph::{EdgeRecord, Graph, NodeRecord};
