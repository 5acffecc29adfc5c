//! Retirement Planner - Multi-phase retirement projection engine with Monte Carlo analysis
//!
//! This library provides:
//! - Four life-phase models (accumulation, phased, active and late retirement)
//! - A deterministic pipeline chaining the phases into one projection
//! - Monte Carlo simulation of plan survival under randomized returns and inflation
//! - Summary statistics (success probability, percentile bands, terminal distribution)
//! - What-if scenario comparison against a base plan

pub mod error;
pub mod formulas;
pub mod phases;
pub mod plan;
pub mod projection;
pub mod monte_carlo;
pub mod statistics;
pub mod scenario;

// Re-export commonly used types
pub use error::{PlanError, Result};
pub use phases::{FinancialState, PhaseKind, PhaseParameters, PhaseReport, YearSnapshot};
pub use plan::{load_plan_file, LoadError, PlanFile, RetirementPlan};
pub use projection::{project_plan, ProjectionPipeline, ProjectionResult, ReturnSequence};
pub use monte_carlo::{MonteCarloEngine, SimulationConfig, SimulationRun, TrialOutcome};
pub use statistics::{SimulationSummary, StatisticsAggregator};
pub use scenario::{Adjustment, Scenario, ScenarioRunner};
