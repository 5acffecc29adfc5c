//! What-if comparisons against a base plan
//!
//! Holds one base plan, derives adjusted copies of it and projects them side by
//! side. Scenarios are independent, so batches run in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::monte_carlo::{MonteCarloEngine, SimulationConfig};
use crate::plan::RetirementPlan;
use crate::projection::{project_plan, ProjectionSummary};
use crate::statistics::SimulationSummary;

/// One change applied to the base plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// Add to every phase's expected return (e.g. `-0.01` for one point lower)
    ReturnShift(f64),
    /// Multiply all retirement spending: withdrawals, expenses, healthcare and LTC costs
    ExpenseScale(f64),
    /// Multiply monthly contributions and continued contributions in phased retirement
    ContributionScale(f64),
    /// Work longer (or shorter, if negative) before phased retirement begins
    ExtraAccumulationYears(i32),
}

impl Adjustment {
    fn apply(self, plan: &mut RetirementPlan) {
        match self {
            Adjustment::ReturnShift(delta) => {
                plan.accumulation.expected_return += delta;
                plan.phased_retirement.expected_return += delta;
                plan.active_retirement.expected_return += delta;
                plan.late_retirement.expected_return += delta;
            }
            Adjustment::ExpenseScale(factor) => {
                plan.phased_retirement.annual_withdrawal *= factor;
                plan.active_retirement.annual_expenses *= factor;
                plan.active_retirement.annual_healthcare_costs *= factor;
                plan.late_retirement.annual_basic_expenses *= factor;
                plan.late_retirement.annual_healthcare_costs *= factor;
                plan.late_retirement.annual_ltc_cost *= factor;
            }
            Adjustment::ContributionScale(factor) => {
                plan.accumulation.monthly_contribution *= factor;
                if let Some(contribution) = plan.phased_retirement.annual_contribution.as_mut() {
                    *contribution *= factor;
                }
            }
            Adjustment::ExtraAccumulationYears(years) => {
                plan.accumulation.duration_years += years;
            }
        }
    }
}

/// Named set of adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adjustments: Vec::new(),
        }
    }

    pub fn with(mut self, adjustment: Adjustment) -> Self {
        self.adjustments.push(adjustment);
        self
    }

    /// Common what-if questions: the base plan plus four single-lever changes
    pub fn standard_set() -> Vec<Scenario> {
        vec![
            Scenario::new("Base plan"),
            Scenario::new("Retire 2 years later").with(Adjustment::ExtraAccumulationYears(2)),
            Scenario::new("Returns 1% lower").with(Adjustment::ReturnShift(-0.01)),
            Scenario::new("Spend 10% less").with(Adjustment::ExpenseScale(0.9)),
            Scenario::new("Save 20% more").with(Adjustment::ContributionScale(1.2)),
        ]
    }
}

/// Deterministic projection summary for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub summary: ProjectionSummary,
}

#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_plan: RetirementPlan,
}

impl ScenarioRunner {
    pub fn new(base_plan: RetirementPlan) -> Self {
        Self { base_plan }
    }

    pub fn base_plan(&self) -> &RetirementPlan {
        &self.base_plan
    }

    /// Copy of the base plan with the scenario's adjustments applied in order
    pub fn plan_for(&self, scenario: &Scenario) -> RetirementPlan {
        let mut plan = self.base_plan.clone();
        for adjustment in &scenario.adjustments {
            adjustment.apply(&mut plan);
        }
        plan
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioOutcome> {
        let result = project_plan(&self.plan_for(scenario))?;
        Ok(ScenarioOutcome {
            name: scenario.name.clone(),
            summary: result.summary(),
        })
    }

    /// Project every scenario; fails if any adjusted plan is invalid
    pub fn run_scenarios(&self, scenarios: &[Scenario]) -> Result<Vec<ScenarioOutcome>> {
        log::info!("Running {} scenarios", scenarios.len());
        scenarios.par_iter().map(|s| self.run(s)).collect()
    }

    /// Monte Carlo summary for one scenario
    pub fn simulate(&self, scenario: &Scenario, config: &SimulationConfig) -> Result<SimulationSummary> {
        let engine = MonteCarloEngine::new(config.clone());
        Ok(engine.simulate(&self.plan_for(scenario))?.summary)
    }
}
