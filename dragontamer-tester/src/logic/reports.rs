use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use dragontamer_game::Stage;

use super::{SimulationPlan, SimulationRecord};

/// Per-strategy rollup used by the console and markdown reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub runs: usize,
    pub passed: usize,
    pub mean_affinity: f64,
    pub mean_purchases: f64,
    /// Mean tick of hatching over the runs that hatched.
    pub mean_hatch_tick: Option<f64>,
    pub best_stage: Stage,
}

#[must_use]
pub fn summarize(records: &[SimulationRecord]) -> Vec<StrategySummary> {
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        if !order.contains(&record.strategy.as_str()) {
            order.push(&record.strategy);
        }
    }

    order
        .into_iter()
        .map(|strategy| {
            let runs: Vec<&SimulationRecord> = records
                .iter()
                .filter(|record| record.strategy == strategy)
                .collect();
            #[allow(clippy::cast_precision_loss)]
            let count = runs.len() as f64;
            let hatch_ticks: Vec<f64> = runs
                .iter()
                .filter_map(|record| record.reached_at(Stage::Hatchling))
                .map(f64::from)
                .collect();
            #[allow(clippy::cast_precision_loss)]
            let mean_hatch_tick = (!hatch_ticks.is_empty())
                .then(|| hatch_ticks.iter().sum::<f64>() / hatch_ticks.len() as f64);
            StrategySummary {
                strategy: strategy.to_string(),
                runs: runs.len(),
                passed: runs.iter().filter(|record| record.passed).count(),
                mean_affinity: runs.iter().map(|record| record.final_affinity).sum::<f64>()
                    / count,
                mean_purchases: runs
                    .iter()
                    .map(|record| f64::from(record.purchases))
                    .sum::<f64>()
                    / count,
                mean_hatch_tick,
                best_stage: runs
                    .iter()
                    .map(|record| record.final_stage)
                    .max()
                    .unwrap_or_default(),
            }
        })
        .collect()
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[SimulationRecord],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=============================".cyan())?;

    let total = records.len();
    let passed = records.iter().filter(|r| r.passed).count();
    writeln!(out, "Total runs: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for record in records {
        let status = if record.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} seed {} ({})",
            status,
            record.strategy.bold(),
            record.seed,
            record.creature_type
        )?;
        writeln!(
            out,
            "   Stage: {} | Affinity: {:.1} | Bond strength: {:.2}",
            record.final_stage, record.final_affinity, record.bond_strength
        )?;
        writeln!(
            out,
            "   Bonds: {} | Feeds: {} | Purchases: {} ({} declined)",
            record.bonds, record.feeds, record.purchases, record.declined_purchases
        )?;
        if !record.failures.is_empty() {
            writeln!(out, "   Failures ({} total):", record.failure_count)?;
            for failure in &record.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "🐉 Strategy Summary".bright_yellow().bold())?;
    writeln!(out, "{}", "==================".yellow())?;
    for summary in summarize(records) {
        let hatch = summary
            .mean_hatch_tick
            .map_or_else(|| "never".to_string(), |tick| format!("{tick:.1}"));
        writeln!(
            out,
            "{:12} runs {} | best {} | mean affinity {:.1} | mean purchases {:.1} | hatch tick {}",
            summary.strategy,
            summary.runs,
            summary.best_stage,
            summary.mean_affinity,
            summary.mean_purchases,
            hatch
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    ticks: u32,
    bonds_per_tick: u32,
    summaries: Vec<StrategySummary>,
    records: &'a [SimulationRecord],
}

pub fn generate_json_report(
    out: &mut dyn Write,
    plan: SimulationPlan,
    records: &[SimulationRecord],
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        ticks: plan.ticks,
        bonds_per_tick: plan.bonds_per_tick,
        summaries: summarize(records),
        records,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    plan: SimulationPlan,
    records: &[SimulationRecord],
) -> Result<()> {
    writeln!(out, "# Dragon Tamer Simulation Results\n")?;
    writeln!(
        out,
        "_Generated {} over {} ticks at {} bonds per tick._\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        plan.ticks,
        plan.bonds_per_tick
    )?;

    writeln!(out, "## Summary\n")?;
    writeln!(
        out,
        "| Strategy | Runs | Passed | Best stage | Mean affinity | Mean purchases |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for summary in summarize(records) {
        writeln!(
            out,
            "| {} | {} | {} | {} | {:.1} | {:.1} |",
            summary.strategy,
            summary.runs,
            summary.passed,
            summary.best_stage,
            summary.mean_affinity,
            summary.mean_purchases
        )?;
    }

    writeln!(out, "\n## Runs\n")?;
    for record in records {
        let status = if record.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "### {} {} seed {}\n",
            status, record.strategy, record.seed
        )?;
        writeln!(out, "- **Creature**: {}", record.creature_type)?;
        writeln!(out, "- **Final stage**: {}", record.final_stage)?;
        for mark in &record.stage_marks {
            writeln!(out, "  - {} at tick {}", mark.stage, mark.tick)?;
        }
        writeln!(
            out,
            "- **Affinity**: {:.1} (bond strength {:.2})",
            record.final_affinity, record.bond_strength
        )?;
        writeln!(
            out,
            "- **Lowest stats**: health {} hunger {} happiness {} energy {}",
            record.min_stats.health,
            record.min_stats.hunger,
            record.min_stats.happiness,
            record.min_stats.energy
        )?;
        if !record.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &record.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
