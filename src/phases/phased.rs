//! Phased retirement: part-time work, optional continued saving, regular withdrawals

use serde::{Deserialize, Serialize};

use super::drawdown::Drawdown;
use super::market::{MarketPath, YearRates};
use super::report::{PhaseMetrics, PhaseReport};
use super::state::{FinancialState, YearSnapshot};
use super::{PhaseKind, MAX_ANNUAL_RETURN, MIN_ANNUAL_RETURN};
use crate::error::{check_amount, check_duration, check_horizon, check_rate, Result};

const CONTEXT: &str = "phased retirement";

/// Inputs for the phased retirement phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasedRetirementParams {
    /// Used only when the phase runs on its own; a pipeline replaces it
    #[serde(default)]
    pub starting_state: Option<FinancialState>,

    pub duration_years: i32,

    /// Annual part-time earnings paid into the portfolio
    #[serde(default)]
    pub part_time_income: Option<f64>,

    /// Annual contribution still being saved
    #[serde(default)]
    pub annual_contribution: Option<f64>,

    /// Annual amount drawn from the portfolio
    pub annual_withdrawal: f64,

    pub expected_return: f64,
}

impl PhasedRetirementParams {
    pub fn validate(&self) -> Result<u32> {
        let years = check_duration(CONTEXT, "duration_years", self.duration_years)?;
        if let Some(income) = self.part_time_income {
            check_amount(CONTEXT, "part_time_income", income)?;
        }
        if let Some(contribution) = self.annual_contribution {
            check_amount(CONTEXT, "annual_contribution", contribution)?;
        }
        check_amount(CONTEXT, "annual_withdrawal", self.annual_withdrawal)?;
        check_rate(CONTEXT, "expected_return", self.expected_return, MIN_ANNUAL_RETURN, MAX_ANNUAL_RETURN)?;
        Ok(years)
    }
}

/// Derived results of the phased retirement phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasedRetirementMetrics {
    pub total_contributions: f64,
    pub total_withdrawals: f64,
    pub total_part_time_income: f64,
    pub investment_gains: f64,
    /// Ending minus starting balance
    pub net_change: f64,
    /// Withdrawals that could not be funded
    pub total_shortfall: f64,
    pub depletion_age: Option<u32>,
}

pub(super) fn run(
    start: &FinancialState,
    params: &PhasedRetirementParams,
    market: Option<MarketPath<'_>>,
) -> Result<PhaseReport> {
    let years = params.validate()?;
    check_horizon(CONTEXT, start.age, years)?;
    let rates = YearRates::new(years, params.expected_return, 0.0, market)?;
    let income = params.part_time_income.unwrap_or(0.0);
    let contribution = params.annual_contribution.unwrap_or(0.0);

    let mut drawdown = Drawdown::new(start.portfolio_value);
    let mut metrics = PhasedRetirementMetrics {
        total_contributions: 0.0,
        total_withdrawals: 0.0,
        total_part_time_income: 0.0,
        investment_gains: 0.0,
        net_change: 0.0,
        total_shortfall: 0.0,
        depletion_age: None,
    };
    let mut trajectory = Vec::with_capacity(years as usize);

    for idx in 0..years {
        let mut snap = YearSnapshot::new(idx + 1, start.age + idx, rates.annual_return(idx), drawdown.balance());
        snap.contributions = contribution;
        snap.income = income;
        drawdown.step(&mut snap, contribution + income, params.annual_withdrawal);

        metrics.total_contributions += contribution;
        metrics.total_part_time_income += income;
        metrics.total_withdrawals += snap.withdrawal;
        metrics.total_shortfall += snap.shortfall;
        metrics.investment_gains += snap.growth;
        trajectory.push(snap);
    }

    metrics.net_change = drawdown.balance() - start.portfolio_value;
    metrics.depletion_age = drawdown.depleted_in_year().map(|year| start.age + year - 1);

    let end_state = FinancialState {
        age: start.age + years,
        portfolio_value: drawdown.balance(),
        cumulative_contributions: start.cumulative_contributions + metrics.total_contributions,
        cumulative_withdrawals: start.cumulative_withdrawals + metrics.total_withdrawals,
    };

    log::debug!(
        "phased retirement: {} years from age {}, ending balance {:.2}",
        years,
        start.age,
        end_state.portfolio_value
    );

    Ok(PhaseReport {
        kind: PhaseKind::PhasedRetirement,
        start_state: *start,
        end_state,
        trajectory,
        metrics: PhaseMetrics::PhasedRetirement(metrics),
    })
}
