//! Run orchestration: catalog → graph → stars → global bonuses → search.

use crate::catalog::standard_catalog;
use crate::config::UserConfig;
use crate::error::Result;
use crate::graph::BuffGraph;
use crate::scoring::ScoreParams;
use crate::search::exact::{self, ExactOutcome};
use crate::search::greedy::{self, GreedyOutcome, GreedySettings};

/// A fully set-up planning run over the standard universe.
#[derive(Debug)]
pub struct Planner {
    graph: BuffGraph,
    params: ScoreParams,
}

impl Planner {
    /// Build the graph, assign stars from the configuration and fold the
    /// global bonuses under the chosen scoring mode. Any lookup or
    /// precondition failure aborts here — before a search begins.
    pub fn from_config(config: &UserConfig, online: bool) -> Result<Self> {
        let mut graph = BuffGraph::from_catalog(standard_catalog())?;
        for (star, names) in config.star_assignment() {
            for name in names {
                graph.assign_star(name, star)?;
            }
        }
        graph.apply_global_bonuses(&config.global_bonuses(), online)?;
        Ok(Planner { graph, params: ScoreParams::new(online) })
    }

    pub fn graph(&self) -> &BuffGraph {
        &self.graph
    }

    pub fn params(&self) -> &ScoreParams {
        &self.params
    }

    /// Number of plans the exhaustive search would visit.
    pub fn search_space_size(&self) -> u64 {
        exact::search_space_size(&self.graph)
    }

    pub fn exact(&self) -> Result<ExactOutcome> {
        exact::search(&self.graph, &self.params)
    }

    pub fn greedy(&self, settings: &GreedySettings) -> Result<GreedyOutcome> {
        greedy::search(&self.graph, self.params, settings)
    }
}
