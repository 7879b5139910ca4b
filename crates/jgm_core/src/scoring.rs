//! Plan-relative income scoring.
//!
//! One direct-income kernel serves every consumer — the exhaustive engine,
//! the greedy engine and the report — so their totals agree bit for bit.
//! A buff counts only while its source building is co-selected in the very
//! plan being scored; nothing is cached across plans.

use crate::error::Result;
use crate::graph::{BuffGraph, BuffSource, BuildingId};
use crate::plan::Plan;

/// Multiplier applied to the designated anchor building's global
/// coefficient when the single-dominant-anchor mode is on. An empirically
/// chosen domain constant.
pub const ANCHOR_INVEST_FACTOR: f64 = 5.0;

/// A single building's global-coefficient override for one scoring run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorBoost {
    pub building: BuildingId,
    pub factor: f64,
}

impl AnchorBoost {
    pub fn invest(building: BuildingId) -> Self {
        AnchorBoost { building, factor: ANCHOR_INVEST_FACTOR }
    }
}

/// Scoring mode, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreParams {
    /// Online scoring when true, offline otherwise.
    pub online: bool,
    pub anchor_boost: Option<AnchorBoost>,
}

impl ScoreParams {
    pub fn new(online: bool) -> Self {
        ScoreParams { online, anchor_boost: None }
    }

    pub fn with_anchor_boost(mut self, boost: AnchorBoost) -> Self {
        self.anchor_boost = Some(boost);
        self
    }
}

/// Income of one plan member, recomputed fresh for every candidate plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberIncome {
    pub id: BuildingId,
    /// Own income including buffs received from co-selected buildings.
    pub direct: f64,
    /// The share of other members' direct income this building produces.
    pub indirect: f64,
}

/// A fully scored plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanScore {
    pub total: f64,
    /// Highest direct income in the plan; earliest member wins ties.
    pub anchor: BuildingId,
    pub incomes: Vec<MemberIncome>,
}

fn mask_of(members: &[BuildingId]) -> u64 {
    let mut mask = 0u64;
    for &id in members {
        debug_assert!(id < 64);
        mask |= 1 << id;
    }
    mask
}

/// Intrinsic income × global multiplier (× anchor boost, if this is the
/// designated building).
fn base_income(graph: &BuffGraph, id: BuildingId, params: &ScoreParams) -> Result<f64> {
    let building = graph.building(id);
    let mut base = building.self_income()? * building.global_coeff()?;
    if let Some(boost) = params.anchor_boost {
        if boost.building == id {
            base *= boost.factor;
        }
    }
    Ok(base)
}

/// Direct income of one member against the membership mask.
fn direct_income(graph: &BuffGraph, id: BuildingId, mask: u64, params: &ScoreParams) -> Result<f64> {
    let mut buff_sum = 0.0;
    for &buff_id in graph.building(id).receives() {
        let buff = graph.buff(buff_id);
        let BuffSource::Building(source) = buff.source else {
            continue; // global bonuses live in the multiplier, not here
        };
        if mask & (1 << source) == 0 || !buff.applies(params.online) {
            continue;
        }
        buff_sum += graph.coefficient_of(buff)?;
    }
    Ok(base_income(graph, id, params)? * (1.0 + buff_sum))
}

/// Total income of a selection: the sum of member direct incomes, in
/// member order. Shared verbatim by both engines.
pub fn total_income(graph: &BuffGraph, members: &[BuildingId], params: &ScoreParams) -> Result<f64> {
    let mask = mask_of(members);
    let mut total = 0.0;
    for &id in members {
        total += direct_income(graph, id, mask, params)?;
    }
    Ok(total)
}

/// Direct and indirect income for every member of a selection. The
/// selection may exceed plan capacity — the merge phase scores oversized
/// unions before trimming them back.
pub fn score_members(
    graph: &BuffGraph,
    members: &[BuildingId],
    params: &ScoreParams,
) -> Result<Vec<MemberIncome>> {
    let mask = mask_of(members);
    let mut incomes = Vec::with_capacity(members.len());
    for &id in members {
        incomes.push(MemberIncome {
            id,
            direct: direct_income(graph, id, mask, params)?,
            indirect: 0.0,
        });
    }

    // Attribute each received coefficient back to its emitting member.
    for income in &mut incomes {
        let mut attributed = 0.0;
        for &buff_id in graph.building(income.id).emits() {
            let buff = graph.buff(buff_id);
            if mask & (1 << buff.target) == 0 || !buff.applies(params.online) {
                continue;
            }
            attributed += base_income(graph, buff.target, params)? * graph.coefficient_of(buff)?;
        }
        income.indirect = attributed;
    }
    Ok(incomes)
}

/// Member incomes ordered by direct + indirect contribution, descending.
/// The sort is stable, so ties keep member order.
pub fn rank_by_contribution(incomes: &[MemberIncome]) -> Vec<MemberIncome> {
    let mut ranked = incomes.to_vec();
    ranked.sort_by(|a, b| (b.direct + b.indirect).total_cmp(&(a.direct + a.indirect)));
    ranked
}

/// Score a complete plan: member incomes, total and anchor.
pub fn score_plan(graph: &BuffGraph, plan: &Plan, params: &ScoreParams) -> Result<PlanScore> {
    let members = plan.members();
    let incomes = score_members(graph, &members, params)?;

    let mut total = 0.0;
    for income in &incomes {
        total += income.direct;
    }

    let Some(mut anchor) = incomes.first().copied() else {
        return Err(crate::error::PlannerError::EmptyPlan);
    };
    for income in &incomes[1..] {
        if income.direct > anchor.direct {
            anchor = *income;
        }
    }

    Ok(PlanScore { total, anchor: anchor.id, incomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use crate::graph::{BuffGraph, GlobalBonuses};

    /// Two residence buildings buffing each other with an E246 table plus
    /// an unrelated commercial bystander.
    fn mutual_pair_graph() -> BuffGraph {
        let defs = parse_catalog(
            r#"
- name: 甲楼
  category: residence
  buffs:
    - { kind: single, table: E246, target: 乙楼 }
- name: 乙楼
  category: residence
  buffs:
    - { kind: single, table: E246, target: 甲楼 }
- name: 丙店
  category: commercial
"#,
        )
        .unwrap();
        let mut graph = BuffGraph::from_catalog(&defs).unwrap();
        graph.assign_star("甲楼", 3).unwrap();
        graph.assign_star("乙楼", 3).unwrap();
        graph.assign_star("丙店", 1).unwrap();
        graph.apply_global_bonuses(&GlobalBonuses::default(), true).unwrap();
        graph
    }

    fn plan_of(graph: &BuffGraph, names: &[&str]) -> Plan {
        let mut plan = Plan::new();
        for name in names {
            let id = graph.require(name).unwrap();
            plan.insert(graph.building(id)).unwrap();
        }
        plan
    }

    #[test]
    fn test_mutual_buff_scenario() {
        let graph = mutual_pair_graph();
        let plan = plan_of(&graph, &["甲楼", "乙楼", "丙店"]);
        let score = score_plan(&graph, &plan, &ScoreParams::new(true)).unwrap();

        // Star 3: intrinsic 6, edge coefficient 0.6 in both directions.
        let buffed = 6.0 * 1.0 * (1.0 + 0.6);
        assert_eq!(score.incomes[0].direct, buffed);
        assert_eq!(score.incomes[1].direct, buffed);
        assert_eq!(score.incomes[2].direct, 1.0);
        assert_eq!(score.total, buffed + buffed + 1.0);

        // Each of the pair hands the other 6 × 0.6 of income.
        assert_eq!(score.incomes[0].indirect, 6.0 * 0.6);
        assert_eq!(score.incomes[1].indirect, 6.0 * 0.6);
        assert_eq!(score.incomes[2].indirect, 0.0);
    }

    #[test]
    fn test_buffs_from_outside_the_plan_are_inactive() {
        let graph = mutual_pair_graph();
        let plan = plan_of(&graph, &["甲楼", "丙店"]);
        let score = score_plan(&graph, &plan, &ScoreParams::new(true)).unwrap();
        assert_eq!(score.incomes[0].direct, 6.0, "乙楼 is not selected, no buff");
    }

    #[test]
    fn test_total_income_matches_score_plan_bit_for_bit() {
        let graph = mutual_pair_graph();
        let plan = plan_of(&graph, &["甲楼", "乙楼", "丙店"]);
        let params = ScoreParams::new(true);
        let total = total_income(&graph, &plan.members(), &params).unwrap();
        let score = score_plan(&graph, &plan, &params).unwrap();
        assert_eq!(total.to_bits(), score.total.to_bits());
    }

    #[test]
    fn test_mode_gates_online_and_offline_buffs() {
        let defs = parse_catalog(
            r#"
- name: 夜楼
  category: residence
  buffs:
    - { kind: offline, table: E246 }
- name: 日楼
  category: residence
  buffs:
    - { kind: online, table: E246 }
"#,
        )
        .unwrap();
        let mut graph = BuffGraph::from_catalog(&defs).unwrap();
        graph.assign_star("夜楼", 3).unwrap();
        graph.assign_star("日楼", 3).unwrap();
        graph.apply_global_bonuses(&GlobalBonuses::default(), true).unwrap();

        let plan = plan_of(&graph, &["夜楼", "日楼"]);
        let online = score_plan(&graph, &plan, &ScoreParams::new(true)).unwrap();
        let offline = score_plan(&graph, &plan, &ScoreParams::new(false)).unwrap();

        // Online: only 日楼's broadcast counts — both members receive it.
        assert_eq!(online.incomes[0].direct, 6.0 * (1.0 + 0.6));
        // Offline: only 夜楼's does.
        assert_eq!(offline.incomes[0].direct, 6.0 * (1.0 + 0.6));
        assert_eq!(online.total.to_bits(), offline.total.to_bits());
    }

    #[test]
    fn test_anchor_is_first_member_with_maximal_direct() {
        let graph = mutual_pair_graph();
        let plan = plan_of(&graph, &["甲楼", "乙楼", "丙店"]);
        let score = score_plan(&graph, &plan, &ScoreParams::new(true)).unwrap();
        // 甲楼 and 乙楼 tie; the earlier member is the anchor.
        assert_eq!(score.anchor, graph.require("甲楼").unwrap());
    }

    #[test]
    fn test_anchor_boost_scales_one_building_only() {
        let graph = mutual_pair_graph();
        let plan = plan_of(&graph, &["甲楼", "乙楼", "丙店"]);
        let a = graph.require("甲楼").unwrap();
        let params = ScoreParams::new(true).with_anchor_boost(AnchorBoost::invest(a));
        let score = score_plan(&graph, &plan, &params).unwrap();

        assert_eq!(score.incomes[0].direct, 6.0 * 5.0 * (1.0 + 0.6));
        assert_eq!(score.incomes[1].direct, 6.0 * 1.0 * (1.0 + 0.6));
        assert_eq!(score.anchor, a);
        // 乙楼's attribution scales with the boosted base of 甲楼.
        assert_eq!(score.incomes[1].indirect, 6.0 * 5.0 * 0.6);
    }
}
