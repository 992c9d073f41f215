use std::collections::BTreeSet;

use log::{info, warn};

use crate::config::Config;
use crate::error::GraphError;
use crate::graph::Graph;

use super::config::LayoutConfig;
use super::key::derive_key;
use super::matcher::{LayoutMatcher, MatchThresholds};
use super::runner::LayoutRunner;
use super::store::PositionStore;

/// Which path the last cached run took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Stale,
    Miss,
    Unavailable,
}

/// Entry point for laying out a freshly loaded graph: reuse a stored layout
/// when it still fits, otherwise compute and store a new one.
pub struct CacheOrchestrator {
    runner: LayoutRunner,
    matcher: LayoutMatcher,
    last_outcome: Option<CacheOutcome>,
}

impl CacheOrchestrator {
    pub fn new(store: PositionStore, thresholds: MatchThresholds) -> Self {
        Self {
            runner: LayoutRunner::new(store),
            matcher: LayoutMatcher::new(thresholds),
            last_outcome: None,
        }
    }

    pub fn from_config(store: PositionStore, config: &Config) -> Self {
        Self::new(store, MatchThresholds::from(config))
    }

    pub fn runner(&self) -> &LayoutRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut LayoutRunner {
        &mut self.runner
    }

    pub fn last_outcome(&self) -> Option<CacheOutcome> {
        self.last_outcome
    }

    /// Cached version of [`LayoutRunner::run`]. Cache problems only force a
    /// recomputation; graph errors from the computation propagate.
    pub fn run_cached(
        &mut self,
        graph: &mut Graph,
        config: &LayoutConfig,
        subs: &BTreeSet<String>,
        separate_subs: bool,
    ) -> Result<bool, GraphError> {
        if !self.runner.store().is_available() {
            self.last_outcome = Some(CacheOutcome::Unavailable);
            return self.runner.run(graph, config, Some(subs), separate_subs, false);
        }

        let key = derive_key(config.name(), subs, separate_subs);
        match self.runner.store().load(&key) {
            Some(cached) => {
                info!("Loaded layout from cache, applying {} positions...", cached.len());
                if self
                    .matcher
                    .apply_if_good_match(&mut self.runner, graph, &cached)
                {
                    self.last_outcome = Some(CacheOutcome::Hit);
                    return Ok(true);
                }
                warn!("Could not apply layout to active graph, recalculating layout...");
                self.last_outcome = Some(CacheOutcome::Stale);
            }
            None => {
                warn!("Layout not in cache, recalculating layout...");
                self.last_outcome = Some(CacheOutcome::Miss);
            }
        }

        self.runner.run(graph, config, Some(subs), separate_subs, true)
    }
}
