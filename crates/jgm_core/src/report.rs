//! Structured result of a search, ready for rendering or JSON output.

use std::fmt::Write as _;

use serde::Serialize;

use crate::catalog::Category;
use crate::graph::{BuffGraph, BuildingId};
use crate::plan::Plan;
use crate::scoring::{rank_by_contribution, MemberIncome, PlanScore};
use crate::search::greedy::GreedyOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub category: Category,
    pub direct: f64,
    pub indirect: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub total: f64,
    pub anchor: String,
    /// Bucket membership, in category order.
    pub residence: Vec<String>,
    pub commercial: Vec<String>,
    pub industry: Vec<String>,
    /// Members by direct + indirect income, descending.
    pub entries: Vec<ReportEntry>,
    /// Members whose own income is at least their handed-out share.
    pub upgrade_priority: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invested: Option<String>,
}

impl PlanReport {
    /// Assemble a report from any scored plan.
    pub fn new(graph: &BuffGraph, plan: &Plan, score: &PlanScore) -> Self {
        let ranked = rank_by_contribution(&score.incomes);
        let upgrade_priority = ranked
            .iter()
            .filter(|income| income.direct >= income.indirect)
            .map(|income| income.id)
            .collect::<Vec<BuildingId>>();
        Self::assemble(graph, plan, score, &ranked, &upgrade_priority, None)
    }

    /// Assemble a report from a greedy outcome, reusing its phase-4
    /// ordering.
    pub fn from_greedy(graph: &BuffGraph, outcome: &GreedyOutcome) -> Self {
        Self::assemble(
            graph,
            &outcome.plan,
            &outcome.score,
            &outcome.ranked,
            &outcome.upgrade_priority,
            outcome.invested,
        )
    }

    fn assemble(
        graph: &BuffGraph,
        plan: &Plan,
        score: &PlanScore,
        ranked: &[MemberIncome],
        upgrade_priority: &[BuildingId],
        invested: Option<BuildingId>,
    ) -> Self {
        let name_of = |id: BuildingId| graph.building(id).name.clone();
        let bucket_names =
            |cat: Category| plan.bucket(cat).iter().map(|&id| name_of(id)).collect::<Vec<_>>();
        PlanReport {
            total: score.total,
            anchor: name_of(score.anchor),
            residence: bucket_names(Category::Residence),
            commercial: bucket_names(Category::Commercial),
            industry: bucket_names(Category::Industry),
            entries: ranked
                .iter()
                .map(|income| ReportEntry {
                    name: name_of(income.id),
                    category: graph.building(income.id).category,
                    direct: income.direct,
                    indirect: income.indirect,
                })
                .collect(),
            upgrade_priority: upgrade_priority.iter().map(|&id| name_of(id)).collect(),
            invested: invested.map(name_of),
        }
    }

    /// Plain-text rendering for the console.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "总收益: {:.3}", self.total);
        let _ = writeln!(out, "主建筑: {}", self.anchor);
        if let Some(invested) = &self.invested {
            let _ = writeln!(out, "重点投资: {}", invested);
        }
        let _ = writeln!(out, "建筑列表:");
        for (label, names) in [
            ("住宅", &self.residence),
            ("商业", &self.commercial),
            ("工业", &self.industry),
        ] {
            let _ = writeln!(out, "        {}: {}", label, names.join(" "));
        }
        let _ = writeln!(out, "收益明细:");
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "        {} ({})  直接 {:.3}  间接 {:.3}",
                entry.name,
                entry.category.display_text(),
                entry.direct,
                entry.indirect
            );
        }
        let _ = writeln!(out, "升级优先: {}", self.upgrade_priority.join(" "));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard_catalog;
    use crate::graph::{BuffGraph, GlobalBonuses};
    use crate::scoring::{score_plan, ScoreParams};

    fn scored_fixture() -> (BuffGraph, Plan, PlanScore) {
        let mut graph = BuffGraph::from_catalog(standard_catalog()).unwrap();
        let names: Vec<String> = graph.buildings().iter().map(|b| b.name.clone()).collect();
        for name in names {
            graph.assign_star(&name, 3).unwrap();
        }
        graph.apply_global_bonuses(&GlobalBonuses::default(), true).unwrap();

        let mut plan = Plan::new();
        for name in ["木屋", "居民楼", "平房", "便利店", "学校", "图书城", "木材厂", "造纸厂", "电厂"] {
            let id = graph.require(name).unwrap();
            plan.insert(graph.building(id)).unwrap();
        }
        let score = score_plan(&graph, &plan, &ScoreParams::new(true)).unwrap();
        (graph, plan, score)
    }

    #[test]
    fn test_report_structure() {
        let (graph, plan, score) = scored_fixture();
        let report = PlanReport::new(&graph, &plan, &score);

        assert_eq!(report.residence, vec!["木屋", "居民楼", "平房"]);
        assert_eq!(report.entries.len(), 9);
        for pair in report.entries.windows(2) {
            assert!(pair[0].direct + pair[0].indirect >= pair[1].direct + pair[1].indirect);
        }
        assert_eq!(report.total, score.total);
        assert!(report.invested.is_none());
    }

    #[test]
    fn test_render_mentions_every_member() {
        let (graph, plan, score) = scored_fixture();
        let report = PlanReport::new(&graph, &plan, &score);
        let text = report.render();
        assert!(text.contains("总收益"));
        for entry in &report.entries {
            assert!(text.contains(&entry.name));
        }
    }

    #[test]
    fn test_report_serializes_to_json() {
        let (graph, plan, score) = scored_fixture();
        let report = PlanReport::new(&graph, &plan, &score);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"total\""));
        assert!(json.contains("\"upgrade_priority\""));
        assert!(!json.contains("\"invested\""), "absent investment is omitted");
    }
}
