use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub default_sub_ontologies: Vec<String>,
    pub all_sub_ontologies: Vec<String>,
    pub helper_graphs: Vec<String>,
    pub log_level: String,
    pub layout_cache_min_recall: f64,
    pub layout_cache_min_precision: f64,
    pub sparql_endpoint: String,
    pub sparql_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        let subs = ["meta", "bb", "ob", "ciox", "he", "it4it"]
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();

        Self {
            default_sub_ontologies: subs.clone(),
            all_sub_ontologies: subs,
            helper_graphs: vec!["limes-exact".to_owned(), "match".to_owned()],
            log_level: "info".to_owned(),
            layout_cache_min_recall: 0.95,
            layout_cache_min_precision: 0.5,
            sparql_endpoint: "https://www.snik.eu/sparql".to_owned(),
            sparql_prefix: "http://www.snik.eu/ontology/".to_owned(),
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Requested subontologies this deployment does not know about.
    pub fn unknown_sub_ontologies<'a>(
        &self,
        subs: impl IntoIterator<Item = &'a String>,
    ) -> Vec<&'a str> {
        subs.into_iter()
            .filter(|sub| !self.all_sub_ontologies.contains(sub))
            .map(String::as_str)
            .collect()
    }

    pub fn default_graphs(&self) -> Vec<String> {
        self.default_sub_ontologies
            .iter()
            .chain(&self.helper_graphs)
            .cloned()
            .collect()
    }

    pub fn from_clause(&self) -> String {
        self.default_graphs()
            .iter()
            .map(|graph| format!("FROM <{}{graph}>", self.sparql_prefix))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn from_named_clause(&self) -> String {
        self.from_clause().replace("FROM", "FROM NAMED")
    }

    pub fn class_query(&self) -> String {
        format!(
            r#"select ?id
  group_concat(distinct(concat(?l,"@",lang(?l)));separator="|") as ?l
  substr(replace(str(sample(?st)),"{prefix}meta/",""),1,1) as ?st
  replace(str(?src),"{prefix}","") as ?prefix
  sample(?inst) as ?inst
  {from}
  {{
    ?id a owl:Class.

    OPTIONAL {{?src ov:defines ?id.}}
    OPTIONAL {{?id meta:subTopClass ?st.}}
    OPTIONAL {{?id rdfs:label ?l.}}
    OPTIONAL {{?inst a ?id.}}
  }}"#,
            prefix = self.sparql_prefix,
            from = self.from_clause(),
        )
    }

    pub fn property_query(&self) -> String {
        format!(
            r#"select ?c ?p ?d ?g (MIN(?ax) as ?ax)
  {from}
  {from_named}
  {{
   graph ?g {{?c ?p ?d.}}
   owl:Class ^a ?c,?d.
   filter(?p!=meta:subTopClass)
   OPTIONAL
   {{
    ?ax a owl:Axiom;
        owl:annotatedSource ?c;
        owl:annotatedProperty ?p;
        owl:annotatedTarget ?d.
   }}
  }}"#,
            from = self.from_clause(),
            from_named = self.from_named_clause(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = Config::default();
        assert_eq!(config.layout_cache_min_recall, 0.95);
        assert_eq!(config.layout_cache_min_precision, 0.5);
        assert_eq!(config.default_graphs().len(), 8);
    }

    #[test]
    fn flags_unknown_sub_ontologies() {
        let config = Config::default();
        let requested = vec!["meta".to_owned(), "xyz".to_owned(), "it4it".to_owned()];
        assert_eq!(config.unknown_sub_ontologies(&requested), vec!["xyz"]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let raw = r#"{"layoutCacheMinRecall": 0.8, "defaultSubOntologies": ["meta"]}"#;
        let config: Config = serde_json::from_str(raw).expect("valid config");
        assert_eq!(config.layout_cache_min_recall, 0.8);
        assert_eq!(config.layout_cache_min_precision, 0.5);
        assert_eq!(config.default_graphs(), vec!["meta", "limes-exact", "match"]);
    }

    #[test]
    fn from_clauses_list_every_graph() {
        let config = Config {
            default_sub_ontologies: vec!["meta".to_owned()],
            helper_graphs: vec!["match".to_owned()],
            ..Config::default()
        };
        assert_eq!(
            config.from_clause(),
            "FROM <http://www.snik.eu/ontology/meta>\nFROM <http://www.snik.eu/ontology/match>"
        );
        assert!(config.from_named_clause().starts_with("FROM NAMED <"));
        assert!(config.property_query().contains("FROM NAMED <http://www.snik.eu/ontology/meta>"));
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"layoutCacheMinPrecision": 0.25}"#).expect("write");

        let config = Config::from_path(&path).expect("load");
        assert_eq!(config.layout_cache_min_precision, 0.25);
        assert!(Config::from_path(&dir.path().join("missing.json")).is_err());
    }
}
