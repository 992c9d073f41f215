use std::collections::HashMap;

use log::{debug, info, warn};

use crate::config::Config;
use crate::geometry::Position;
use crate::graph::Graph;

use super::runner::LayoutRunner;
use super::store::PositionList;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchThresholds {
    pub min_precision: f64,
    pub min_recall: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            min_precision: 0.5,
            min_recall: 0.95,
        }
    }
}

impl From<&Config> for MatchThresholds {
    fn from(config: &Config) -> Self {
        Self {
            min_precision: config.layout_cache_min_precision,
            min_recall: config.layout_cache_min_recall,
        }
    }
}

/// Overlap between a cached layout and the nodes of the live graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchReport {
    pub hits: usize,
    pub misses: usize,
    pub cached: usize,
}

impl MatchReport {
    /// Share of cached entries that belong to a live node.
    pub fn precision(&self) -> f64 {
        if self.cached == 0 {
            0.0
        } else {
            self.hits as f64 / self.cached as f64
        }
    }

    /// Share of live nodes that have a cached entry.
    pub fn recall(&self) -> f64 {
        let live = self.hits + self.misses;
        if live == 0 {
            0.0
        } else {
            self.hits as f64 / live as f64
        }
    }

    pub fn decide(&self, thresholds: MatchThresholds) -> MatchDecision {
        if self.hits == 0 {
            return MatchDecision::NoHits;
        }
        if self.misses == 0 {
            return MatchDecision::Perfect;
        }

        let precision = self.precision();
        if precision < thresholds.min_precision {
            return MatchDecision::LowPrecision(precision);
        }
        let recall = self.recall();
        if recall < thresholds.min_recall {
            return MatchDecision::LowRecall(recall);
        }
        MatchDecision::Accepted
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchDecision {
    Perfect,
    Accepted,
    NoHits,
    LowPrecision(f64),
    LowRecall(f64),
}

impl MatchDecision {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Perfect | Self::Accepted)
    }
}

/// Decides whether a cached layout still fits the graph and applies it if so.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutMatcher {
    thresholds: MatchThresholds,
}

impl LayoutMatcher {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Counts how many live nodes the cached list covers. Duplicate ids in
    /// the list resolve to their last entry.
    pub fn evaluate(
        &self,
        graph: &Graph,
        cached: &PositionList,
    ) -> (HashMap<String, Position>, MatchReport) {
        let mapping = cached.iter().cloned().collect::<HashMap<_, _>>();

        let mut hits = 0usize;
        let mut misses = 0usize;
        for node in graph.nodes().iter().filter(|node| !node.is_virtual()) {
            if mapping.contains_key(&node.id) {
                hits += 1;
            } else {
                misses += 1;
            }
        }

        let report = MatchReport {
            hits,
            misses,
            cached: cached.len(),
        };
        (mapping, report)
    }

    /// Applies `cached` as a preset layout when it matches the graph well
    /// enough. A rejected list leaves the graph untouched.
    pub fn apply_if_good_match(
        &self,
        runner: &mut LayoutRunner,
        graph: &mut Graph,
        cached: &PositionList,
    ) -> bool {
        let (mapping, report) = self.evaluate(graph, cached);

        match report.decide(self.thresholds) {
            MatchDecision::Perfect => debug!("Layout applies with 100% overlap."),
            MatchDecision::Accepted => info!(
                "{}/{} node positions set, {} superfluous layout positions.",
                report.hits,
                report.hits + report.misses,
                report.cached.saturating_sub(report.hits)
            ),
            MatchDecision::NoHits => {
                warn!("No cached position matches a node of the graph.");
                return false;
            }
            MatchDecision::LowPrecision(precision) => {
                warn!(
                    "Precision of {precision} less than minimal required precision of {}.",
                    self.thresholds.min_precision
                );
                return false;
            }
            MatchDecision::LowRecall(recall) => {
                warn!(
                    "Recall of {recall} less than minimal required recall of {}.",
                    self.thresholds.min_recall
                );
                return false;
            }
        }

        runner.apply_positions(graph, mapping)
    }
}
