//! JiaGuoMeng layout planner CLI.
//!
//! Loads the user configuration, builds the buff graph and runs either the
//! greedy heuristic (default) or the exhaustive search (`--exact`).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use jgm_core::report::PlanReport;
use jgm_core::{GreedySettings, Planner, UserConfig};

#[derive(Parser)]
#[command(name = "jgm")]
#[command(version)]
#[command(about = "Layout planner for JiaGuoMeng building plans", long_about = None)]
struct Cli {
    /// Exhaustive search over every plan combination (slow, optimal)
    #[arg(short, long)]
    exact: bool,

    /// Score in offline mode instead of online
    #[arg(long)]
    offline: bool,

    /// Invest everything into one anchor building (×5 its global bonus)
    #[arg(long)]
    anchor: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "jiaguomeng.yml")]
    config: PathBuf,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = UserConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    let planner = Planner::from_config(&config, !cli.offline)?;

    if cli.exact {
        run_exact(&planner, cli.json)
    } else {
        run_greedy(&planner, cli.anchor, cli.json)
    }
}

fn run_exact(planner: &Planner, json: bool) -> anyhow::Result<()> {
    println!("🔍 Exhaustive search over {} plans...", planner.search_space_size());

    let outcome = planner.exact()?;
    let Some(best) = outcome.best else {
        anyhow::bail!("a category holds fewer than 3 buildings; no complete plan exists");
    };

    let best_report = PlanReport::new(planner.graph(), &best.plan, &best.score);
    let second_report = outcome
        .runner_up
        .map(|ranked| PlanReport::new(planner.graph(), &ranked.plan, &ranked.score));

    if json {
        let doc = serde_json::json!({
            "plans_evaluated": outcome.plans_evaluated,
            "best": best_report,
            "runner_up": second_report,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("\n=== 最佳方案 ===");
    print!("{}", best_report.render());
    if let Some(second) = second_report {
        println!("\n=== 次佳方案 ===");
        print!("{}", second.render());
    }
    Ok(())
}

fn run_greedy(planner: &Planner, anchor: bool, json: bool) -> anyhow::Result<()> {
    let settings = GreedySettings { anchor_invest: anchor, ..Default::default() };
    let outcome = planner.greedy(&settings)?;
    let report = PlanReport::from_greedy(planner.graph(), &outcome);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("=== 推荐方案 ===");
    print!("{}", report.render());
    Ok(())
}
