//! Exhaustive plan search.
//!
//! Enumerates every choose-3 combination per category, crosses them into
//! complete plans and keeps the top two by total income. Intended for
//! validating the heuristic against the small fixed universe — the cost is
//! `C(|res|,3) × C(|com|,3) × C(|ind|,3)` and is announced before the run.

use tracing::info;

use crate::catalog::Category;
use crate::error::Result;
use crate::graph::{BuffGraph, BuildingId};
use crate::plan::Plan;
use crate::scoring::{score_plan, total_income, PlanScore, ScoreParams};

/// A plan together with its full score.
#[derive(Debug, Clone)]
pub struct RankedPlan {
    pub plan: Plan,
    pub score: PlanScore,
}

#[derive(Debug, Clone)]
pub struct ExactOutcome {
    pub best: Option<RankedPlan>,
    pub runner_up: Option<RankedPlan>,
    pub plans_evaluated: u64,
}

fn choose_count(n: u64) -> u64 {
    if n < 3 {
        0
    } else {
        n * (n - 1) * (n - 2) / 6
    }
}

/// Number of complete plans the search will visit.
pub fn search_space_size(graph: &BuffGraph) -> u64 {
    Category::ALL
        .iter()
        .map(|&cat| choose_count(graph.category_members(cat).len() as u64))
        .product()
}

/// All 3-subsets in lexicographic index order.
fn choose_3(ids: &[BuildingId]) -> Vec<[BuildingId; 3]> {
    let mut combos = Vec::with_capacity(choose_count(ids.len() as u64) as usize);
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            for k in (j + 1)..ids.len() {
                combos.push([ids[i], ids[j], ids[k]]);
            }
        }
    }
    combos
}

/// Run the exhaustive search. Ties keep the plan enumerated first: a later
/// plan replaces a slot only by strictly exceeding it.
pub fn search(graph: &BuffGraph, params: &ScoreParams) -> Result<ExactOutcome> {
    let residence = choose_3(graph.category_members(Category::Residence));
    let commercial = choose_3(graph.category_members(Category::Commercial));
    let industry = choose_3(graph.category_members(Category::Industry));

    info!(total = search_space_size(graph), "exhaustive search space");

    let mut best: Option<([BuildingId; 9], f64)> = None;
    let mut runner_up: Option<([BuildingId; 9], f64)> = None;
    let mut evaluated = 0u64;

    // Member order is bucket order (residence, commercial, industry), the
    // same order a Plan yields — totals stay bit-comparable.
    for r in &residence {
        for c in &commercial {
            for i in &industry {
                let members =
                    [r[0], r[1], r[2], c[0], c[1], c[2], i[0], i[1], i[2]];
                let total = total_income(graph, &members, params)?;
                evaluated += 1;

                if best.map_or(true, |(_, t)| total > t) {
                    runner_up = best;
                    best = Some((members, total));
                } else if runner_up.map_or(true, |(_, t)| total > t) {
                    runner_up = Some((members, total));
                }
            }
        }
    }

    let rank = |entry: Option<([BuildingId; 9], f64)>| -> Result<Option<RankedPlan>> {
        let Some((members, _)) = entry else { return Ok(None) };
        let mut plan = Plan::new();
        for id in members {
            plan.insert(graph.building(id))?;
        }
        let score = score_plan(graph, &plan, params)?;
        Ok(Some(RankedPlan { plan, score }))
    };

    Ok(ExactOutcome { best: rank(best)?, runner_up: rank(runner_up)?, plans_evaluated: evaluated })
}
