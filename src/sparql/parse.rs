use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BindingValue {
    pub value: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "xml:lang")]
    pub lang: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
}

impl BindingValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: Some("literal".to_owned()),
            lang: None,
            datatype: None,
        }
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: Some("uri".to_owned()),
            lang: None,
            datatype: None,
        }
    }
}

/// One result row: variable name to bound value. Unbound variables are absent.
pub type Binding = HashMap<String, BindingValue>;

/// Parses a SPARQL 1.1 JSON results document into its bindings.
pub fn parse_select_results(raw: &str) -> Result<Vec<Binding>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in SPARQL results")?;
    let bindings = parsed
        .get("results")
        .and_then(|results| results.get("bindings"))
        .ok_or_else(|| anyhow!("SPARQL results document has no results.bindings"))?;

    Vec::<Binding>::deserialize(bindings).context("invalid bindings in SPARQL results")
}
