//! Active retirement: inflation-adjusted spending funded by the portfolio
//!
//! Expenses and healthcare costs inflate year over year from the phase start
//! (the first year is uninflated). Social Security and pension are flat amounts
//! that offset spending; any surplus income is not reinvested.

use serde::{Deserialize, Serialize};

use super::drawdown::Drawdown;
use super::market::{MarketPath, YearRates};
use super::report::{PhaseMetrics, PhaseReport};
use super::state::{FinancialState, YearSnapshot};
use super::{PhaseKind, MAX_ANNUAL_RETURN, MAX_INFLATION_RATE, MIN_ANNUAL_RETURN, MIN_INFLATION_RATE};
use crate::error::{check_amount, check_duration, check_horizon, check_rate, Result};

const CONTEXT: &str = "active retirement";

/// Inputs for the active retirement phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRetirementParams {
    /// Used only when the phase runs on its own; a pipeline replaces it
    #[serde(default)]
    pub starting_state: Option<FinancialState>,

    pub duration_years: i32,

    /// Living expenses in the first year, in today's money
    pub annual_expenses: f64,

    /// Healthcare costs in the first year
    #[serde(default)]
    pub annual_healthcare_costs: f64,

    #[serde(default)]
    pub social_security_income: f64,

    #[serde(default)]
    pub pension_income: f64,

    pub expected_return: f64,

    pub inflation_rate: f64,
}

impl ActiveRetirementParams {
    pub fn validate(&self) -> Result<u32> {
        let years = check_duration(CONTEXT, "duration_years", self.duration_years)?;
        check_amount(CONTEXT, "annual_expenses", self.annual_expenses)?;
        check_amount(CONTEXT, "annual_healthcare_costs", self.annual_healthcare_costs)?;
        check_amount(CONTEXT, "social_security_income", self.social_security_income)?;
        check_amount(CONTEXT, "pension_income", self.pension_income)?;
        check_rate(CONTEXT, "expected_return", self.expected_return, MIN_ANNUAL_RETURN, MAX_ANNUAL_RETURN)?;
        check_rate(CONTEXT, "inflation_rate", self.inflation_rate, MIN_INFLATION_RATE, MAX_INFLATION_RATE)?;
        Ok(years)
    }
}

/// Derived results of the active retirement phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRetirementMetrics {
    pub total_withdrawals: f64,
    pub total_social_security: f64,
    pub total_pension: f64,
    pub investment_gains: f64,
    pub average_annual_withdrawal: f64,
    /// Spending the portfolio could not fund after depletion
    pub total_shortfall: f64,
    /// Year within the phase (1-indexed) in which the balance hit zero
    pub depletion_year: Option<u32>,
    pub depletion_age: Option<u32>,
}

pub(super) fn run(
    start: &FinancialState,
    params: &ActiveRetirementParams,
    market: Option<MarketPath<'_>>,
) -> Result<PhaseReport> {
    let years = params.validate()?;
    check_horizon(CONTEXT, start.age, years)?;
    let rates = YearRates::new(years, params.expected_return, params.inflation_rate, market)?;
    let income = params.social_security_income + params.pension_income;

    let mut drawdown = Drawdown::new(start.portfolio_value);
    let mut price_level = 1.0;
    let mut total_withdrawals = 0.0;
    let mut total_shortfall = 0.0;
    let mut investment_gains = 0.0;
    let mut trajectory = Vec::with_capacity(years as usize);

    for idx in 0..years {
        let mut snap = YearSnapshot::new(idx + 1, start.age + idx, rates.annual_return(idx), drawdown.balance());
        let costs = (params.annual_expenses + params.annual_healthcare_costs) * price_level;
        let need = (costs - income).max(0.0);

        snap.income = income;
        drawdown.step(&mut snap, 0.0, need);

        total_withdrawals += snap.withdrawal;
        total_shortfall += snap.shortfall;
        investment_gains += snap.growth;
        trajectory.push(snap);

        price_level *= 1.0 + rates.inflation(idx);
    }

    let depletion_year = drawdown.depleted_in_year();
    let metrics = ActiveRetirementMetrics {
        total_withdrawals,
        total_social_security: params.social_security_income * years as f64,
        total_pension: params.pension_income * years as f64,
        investment_gains,
        average_annual_withdrawal: if years > 0 { total_withdrawals / years as f64 } else { 0.0 },
        total_shortfall,
        depletion_year,
        depletion_age: depletion_year.map(|year| start.age + year - 1),
    };

    let end_state = FinancialState {
        age: start.age + years,
        portfolio_value: drawdown.balance(),
        cumulative_contributions: start.cumulative_contributions,
        cumulative_withdrawals: start.cumulative_withdrawals + total_withdrawals,
    };

    if let Some(age) = metrics.depletion_age {
        log::debug!("active retirement: portfolio depleted at age {}", age);
    }

    Ok(PhaseReport {
        kind: PhaseKind::ActiveRetirement,
        start_state: *start,
        end_state,
        trajectory,
        metrics: PhaseMetrics::ActiveRetirement(metrics),
    })
}
