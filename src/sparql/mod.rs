mod load;
mod parse;

pub use load::{SparqlTransport, load_graph};
pub use parse::{Binding, BindingValue, parse_select_results};
