//! Greedy heuristic search.
//!
//! Four phases, each feeding the next:
//! 1. seed a candidate plan around every building from its strongest
//!    incoming buffs and rank the candidates,
//! 2. commit the top candidate (optionally boosting its seed as the
//!    designated anchor investment),
//! 3. merge runner-up candidates into the committed plan over widening
//!    windows of the ranking, trimming overfull buckets by marginal value,
//! 4. rescore the final plan and derive the upgrade-priority ordering.
//!
//! Capacity conditions here are expected branch outcomes: a full category
//! skips one addition, a full plan ends the seeding loop.

use std::cmp::Ordering;

use tracing::debug;

use crate::catalog::Category;
use crate::error::{CapacityError, PlannerError, Result};
use crate::graph::{BuffGraph, BuffSource, BuildingId};
use crate::plan::Plan;
use crate::scoring::{
    rank_by_contribution, score_members, score_plan, total_income, AnchorBoost, MemberIncome,
    PlanScore, ScoreParams,
};

/// Upper bounds of the three merge windows over the candidate ranking —
/// empirically chosen domain constants, overridable via
/// [`GreedySettings::windows`].
pub const MERGE_WINDOWS: [usize; 3] = [4, 7, 10];

#[derive(Debug, Clone, Copy)]
pub struct GreedySettings {
    pub windows: [usize; 3],
    /// Multiply the committed seed's global coefficient by
    /// [`crate::scoring::ANCHOR_INVEST_FACTOR`] before all scoring.
    pub anchor_invest: bool,
}

impl Default for GreedySettings {
    fn default() -> Self {
        GreedySettings { windows: MERGE_WINDOWS, anchor_invest: false }
    }
}

/// One building's best local plan, built in phase 1.
#[derive(Debug, Clone)]
pub struct SeedCandidate {
    pub seed: BuildingId,
    pub plan: Plan,
    pub rank_score: f64,
}

#[derive(Debug, Clone)]
pub struct GreedyOutcome {
    pub plan: Plan,
    pub score: PlanScore,
    /// Plan members ordered by direct + indirect income, descending.
    pub ranked: Vec<MemberIncome>,
    /// Members whose own income is at least what they hand to others —
    /// the buildings whose star level matters more than their buff role.
    pub upgrade_priority: Vec<BuildingId>,
    /// Best committed total after each merge window; non-decreasing.
    pub window_totals: Vec<f64>,
    /// The designated anchor investment, when the mode is on.
    pub invested: Option<BuildingId>,
}

/// Phase 1: build and rank every building's local candidate plan.
pub fn seed_candidates(graph: &BuffGraph, params: &ScoreParams) -> Result<Vec<SeedCandidate>> {
    let mut candidates = Vec::with_capacity(graph.buildings().len());

    for seed in graph.buildings() {
        let mut plan = Plan::new();
        plan.insert(seed)?;

        // Incoming building buffs, strongest first; the immutable id is
        // the stable tie-break key.
        let mut incoming: Vec<(BuildingId, f64)> = Vec::new();
        for &buff_id in seed.receives() {
            let buff = graph.buff(buff_id);
            let BuffSource::Building(source) = buff.source else {
                continue;
            };
            if !buff.applies(params.online) {
                continue;
            }
            incoming.push((source, graph.coefficient_of(buff)?));
        }
        incoming.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });

        let mut effect = 1.0;
        for (source, coeff) in incoming {
            if plan.contains(source) {
                // Self-buff or a second edge from a co-selected source:
                // the contributor is in, its coefficient counts.
                effect += coeff;
                continue;
            }
            match plan.insert(graph.building(source)) {
                Ok(()) => effect += coeff,
                Err(CapacityError::CategoryFull(_)) => {}
                Err(CapacityError::PlanFull) => break,
            }
        }

        let rank_score = seed.self_income()? * seed.global_coeff()? * effect;
        candidates.push(SeedCandidate { seed: seed.id, plan, rank_score });
    }

    candidates.sort_by(|a, b| match b.rank_score.total_cmp(&a.rank_score) {
        Ordering::Equal => a.seed.cmp(&b.seed),
        other => other,
    });
    Ok(candidates)
}

/// Phase 3 step: union two plans bucket-wise, trim overfull buckets by
/// direct + indirect income under the merged selection, and return the
/// trimmed plan with its total.
fn merge(graph: &BuffGraph, confirmed: &Plan, other: &Plan, params: &ScoreParams) -> Result<(Plan, f64)> {
    let mut union_members: Vec<BuildingId> = Vec::new();
    for cat in Category::ALL {
        union_members.extend_from_slice(confirmed.bucket(cat));
        for &id in other.bucket(cat) {
            if !confirmed.bucket(cat).contains(&id) {
                union_members.push(id);
            }
        }
    }

    // Scored against the full union, before any trimming.
    let incomes = score_members(graph, &union_members, params)?;

    let mut plan = Plan::new();
    for cat in Category::ALL {
        let mut bucket: Vec<&MemberIncome> = incomes
            .iter()
            .filter(|income| graph.building(income.id).category == cat)
            .collect();
        bucket.sort_by(|a, b| (b.direct + b.indirect).total_cmp(&(a.direct + a.indirect)));
        bucket.truncate(3);
        for income in bucket {
            plan.insert(graph.building(income.id))?;
        }
    }

    let total = total_income(graph, &plan.members(), params)?;
    Ok((plan, total))
}

/// Run all four phases.
pub fn search(
    graph: &BuffGraph,
    params: ScoreParams,
    settings: &GreedySettings,
) -> Result<GreedyOutcome> {
    let mut params = params;
    let candidates = seed_candidates(graph, &params)?;
    let top = candidates.first().ok_or(PlannerError::EmptyPlan)?;

    // Phase 2: the top candidate becomes the committed plan; the anchor
    // investment, if any, is designated now and applied to every total
    // computed from here on.
    if settings.anchor_invest {
        params.anchor_boost = Some(AnchorBoost::invest(top.seed));
    }
    let mut confirmed = top.plan.clone();
    let mut best_total = total_income(graph, &confirmed.members(), &params)?;
    debug!(seed = %graph.building(top.seed).name, total = best_total, "primary commitment");

    // Phase 3: widening windows over the ranking, in order, no revisits.
    let mut window_totals = Vec::with_capacity(settings.windows.len());
    for &window in &settings.windows {
        let end = window.min(candidates.len());
        for candidate in candidates.iter().take(end).skip(1) {
            let (merged, merged_total) = merge(graph, &confirmed, &candidate.plan, &params)?;
            if merged_total > best_total {
                debug!(
                    seed = %graph.building(candidate.seed).name,
                    total = merged_total,
                    "merge improved the committed plan"
                );
                confirmed = merged;
                best_total = merged_total;
            }
        }
        window_totals.push(best_total);
    }

    // Phase 4: final scoring and report material.
    let score = score_plan(graph, &confirmed, &params)?;
    let ranked = rank_by_contribution(&score.incomes);
    let upgrade_priority = ranked
        .iter()
        .filter(|income| income.direct >= income.indirect)
        .map(|income| income.id)
        .collect();

    Ok(GreedyOutcome {
        plan: confirmed,
        score,
        ranked,
        upgrade_priority,
        window_totals,
        invested: params.anchor_boost.map(|b| b.building),
    })
}
