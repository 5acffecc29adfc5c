//! Retirement Planner CLI
//!
//! Command-line interface for deterministic projections, Monte Carlo runs and
//! what-if comparisons of a JSON plan file

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use retirement_planner::monte_carlo::{ReturnDistribution, ReturnModel};
use retirement_planner::{
    load_plan_file, MonteCarloEngine, PlanFile, ProjectionPipeline, ProjectionResult, RetirementPlan, Scenario,
    ScenarioRunner, SimulationConfig, SimulationSummary,
};

#[derive(Parser)]
#[command(author, version, about = "Multi-phase retirement projections and Monte Carlo plan analysis")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deterministic projection using each phase's expected rates
    Project {
        plan: PathBuf,
        /// Write the year-by-year trajectory to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print the full result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Monte Carlo simulation of plan survival
    Simulate {
        plan: PathBuf,
        #[arg(long)]
        trials: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        /// Annual return volatility, overriding the plan file
        #[arg(long)]
        volatility: Option<f64>,
        /// Write per-year percentile bands to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Compare the plan against common what-if adjustments
    Compare {
        plan: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print an example plan file
    Example,
}

/// JSON output envelope
#[derive(Serialize)]
struct Timestamped<'a, T: Serialize> {
    generated_at: DateTime<Utc>,
    result: &'a T,
}

#[derive(Serialize)]
struct TrajectoryRow {
    phase: &'static str,
    year: u32,
    age: u32,
    annual_return: f64,
    starting_balance: f64,
    growth: f64,
    contributions: f64,
    income: f64,
    withdrawal_need: f64,
    withdrawal: f64,
    shortfall: f64,
    ending_balance: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Project { plan, csv, json } => project(&plan, csv.as_deref(), json),
        Command::Simulate {
            plan,
            trials,
            seed,
            volatility,
            csv,
            json,
        } => simulate(&plan, trials, seed, volatility, csv.as_deref(), json),
        Command::Compare { plan, json } => compare(&plan, json),
        Command::Example => {
            let file = PlanFile {
                plan: RetirementPlan::example(),
                simulation: SimulationConfig::default(),
            };
            println!("{}", serde_json::to_string_pretty(&file)?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(result: &T) -> Result<()> {
    let envelope = Timestamped {
        generated_at: Utc::now(),
        result,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn project(path: &Path, csv_path: Option<&Path>, json: bool) -> Result<()> {
    let file = load_plan_file(path)?;
    let pipeline = ProjectionPipeline::new(&file.plan)?;
    let result = pipeline.project()?;

    if let Some(csv_path) = csv_path {
        write_trajectory_csv(&result, csv_path)?;
    }
    if json {
        return print_json(&result);
    }

    println!("{:<20} {:>9} {:>16} {:>16} {:>10}", "Phase", "Ages", "Start Balance", "End Balance", "Depleted");
    for phase in &result.phases {
        let depleted = phase
            .depletion_age()
            .map_or_else(|| "-".to_string(), |age| format!("age {age}"));
        println!(
            "{:<20} {:>4}-{:<4} {:>16.2} {:>16.2} {:>10}",
            phase.kind.label(),
            phase.start_state.age,
            phase.end_state.age,
            phase.start_state.portfolio_value,
            phase.end_state.portfolio_value,
            depleted
        );
    }

    let summary = result.summary();
    println!("\nSummary:");
    println!("  Years Projected: {}", summary.total_years);
    println!("  Balance at Retirement: ${:.2}", summary.balance_at_retirement);
    println!("  Peak Balance: ${:.2}", summary.peak_balance);
    println!("  Total Contributions: ${:.2}", summary.total_contributions);
    println!("  Total Withdrawals: ${:.2}", summary.total_withdrawals);
    println!("  Unfunded Spending: ${:.2}", summary.total_shortfall);
    println!("  Final Balance: ${:.2}", summary.final_balance);
    match summary.legacy_surplus {
        Some(surplus) if surplus >= 0.0 => println!("  Legacy Surplus: ${:.2}", surplus),
        Some(surplus) => println!("  Legacy Shortfall: ${:.2}", -surplus),
        None => {}
    }
    Ok(())
}

fn write_trajectory_csv(result: &ProjectionResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for phase in &result.phases {
        for year in &phase.trajectory {
            writer.serialize(TrajectoryRow {
                phase: phase.kind.label(),
                year: year.year,
                age: year.age,
                annual_return: year.annual_return,
                starting_balance: year.starting_balance,
                growth: year.growth,
                contributions: year.contributions,
                income: year.income,
                withdrawal_need: year.withdrawal_need,
                withdrawal: year.withdrawal,
                shortfall: year.shortfall,
                ending_balance: year.ending_balance,
            })?;
        }
    }
    writer.flush()?;
    println!("Trajectory written to {}", path.display());
    Ok(())
}

fn simulate(
    path: &Path,
    trials: Option<u32>,
    seed: Option<u64>,
    volatility: Option<f64>,
    csv_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let PlanFile { plan, mut simulation } = load_plan_file(path)?;
    if let Some(trials) = trials {
        simulation.trial_count = trials;
    }
    if let Some(seed) = seed {
        simulation.seed = Some(seed);
    }
    if let Some(volatility) = volatility {
        let with_vol = |d: ReturnDistribution| ReturnDistribution { volatility, ..d };
        simulation.returns = match simulation.returns {
            ReturnModel::Global(d) => ReturnModel::Global(with_vol(d)),
            ReturnModel::PerPhase(ds) => ReturnModel::PerPhase(ds.map(with_vol)),
        };
    }

    let start = Instant::now();
    let run = MonteCarloEngine::new(simulation).simulate(&plan)?;
    let summary = &run.summary;

    if let Some(csv_path) = csv_path {
        write_bands_csv(summary, csv_path)?;
    }
    if json {
        return print_json(summary);
    }

    println!("Ran {} trials in {:?}", summary.trial_count, start.elapsed());
    if let Some(seed) = summary.seed {
        println!("  Seed: {}", seed);
    }
    println!("  Success Probability: {:.1}%", summary.success_probability * 100.0);
    println!("  Depletion Rate: {:.1}%", summary.depletion_rate * 100.0);
    if let Some(age) = summary.median_depletion_age {
        println!("  Median Depletion Age: {:.1}", age);
    }

    let terminal = &summary.terminal;
    println!("\nFinal Portfolio:");
    println!("  Mean: ${:.2}", terminal.mean);
    println!("  Median: ${:.2}", terminal.median);
    println!("  Std Dev: ${:.2}", terminal.std_dev);
    println!("  Range: ${:.2} - ${:.2}", terminal.min, terminal.max);
    for p in &terminal.percentiles {
        println!("  P{:<3}: ${:.2}", p.percentile, p.value);
    }
    Ok(())
}

fn write_bands_csv(summary: &SimulationSummary, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["age".to_string()];
    header.extend(summary.percentile_trajectories.iter().map(|t| format!("p{}", t.percentile)));
    writer.write_record(&header)?;

    for (year, age) in summary.ages.iter().enumerate() {
        let mut record = vec![age.to_string()];
        record.extend(
            summary
                .percentile_trajectories
                .iter()
                .map(|t| format!("{:.2}", t.values[year])),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    println!("Percentile bands written to {}", path.display());
    Ok(())
}

fn compare(path: &Path, json: bool) -> Result<()> {
    let file = load_plan_file(path)?;
    let runner = ScenarioRunner::new(file.plan);
    let outcomes = runner.run_scenarios(&Scenario::standard_set())?;

    if json {
        return print_json(&outcomes);
    }

    let mut out = std::io::stdout().lock();
    writeln!(out, "{:<24} {:>18} {:>16} {:>10}", "Scenario", "At Retirement", "Final Balance", "Depleted")?;
    for outcome in &outcomes {
        let s = &outcome.summary;
        let depleted = s.depletion_age.map_or_else(|| "-".to_string(), |age| format!("age {age}"));
        writeln!(
            out,
            "{:<24} {:>18.2} {:>16.2} {:>10}",
            outcome.name, s.balance_at_retirement, s.final_balance, depleted
        )?;
    }
    Ok(())
}
