//! Accumulation phase: building the portfolio through contributions
//!
//! Compounds monthly at `annual_return / 12`. Each monthly contribution (personal
//! plus employer match) is credited at the start of its month, so one year with
//! return R and monthly inflow C moves the balance B to
//! `B·(1+R/12)^12 + C·(1+R/12)·((1+R/12)^12 − 1)/(R/12)`.
//! Contributions and salary step up once per year by the salary growth rate.

use serde::{Deserialize, Serialize};

use super::market::{MarketPath, YearRates};
use super::report::{PhaseMetrics, PhaseReport};
use super::state::{FinancialState, YearSnapshot};
use super::{PhaseKind, MAX_ANNUAL_RETURN, MIN_ANNUAL_RETURN};
use crate::error::{check_age, check_amount, check_duration, check_horizon, check_rate, Result};
use crate::formulas::{annuity_due_year_factor, safe_annual_withdrawal};

const CONTEXT: &str = "accumulation";

/// Inputs for the accumulation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulationParams {
    /// Age when contributions start
    pub start_age: u32,

    /// Years of contributions
    pub duration_years: i32,

    /// Portfolio balance at `start_age`
    pub current_savings: f64,

    /// Personal contribution per month in the first year
    pub monthly_contribution: f64,

    /// Fraction of the personal contribution the employer matches (0.5 = 50%)
    #[serde(default)]
    pub employer_match_rate: f64,

    /// Matching stops at this fraction of salary (0.06 = "up to 6%").
    /// Only applied together with `annual_salary`.
    #[serde(default)]
    pub employer_match_limit: Option<f64>,

    /// Salary in the first year, used for the match limit
    #[serde(default)]
    pub annual_salary: Option<f64>,

    /// Annual growth of salary and contributions
    #[serde(default)]
    pub salary_growth_rate: f64,

    /// Expected annual return
    pub expected_return: f64,
}

impl AccumulationParams {
    /// State the whole projection starts from
    pub fn initial_state(&self) -> FinancialState {
        FinancialState::new(self.start_age, self.current_savings)
    }

    /// Validate the parameters and return the duration in years
    pub fn validate(&self) -> Result<u32> {
        let years = check_duration(CONTEXT, "duration_years", self.duration_years)?;
        check_age(CONTEXT, "start_age", self.start_age)?;
        check_amount(CONTEXT, "current_savings", self.current_savings)?;
        check_amount(CONTEXT, "monthly_contribution", self.monthly_contribution)?;
        check_rate(CONTEXT, "employer_match_rate", self.employer_match_rate, 0.0, 2.0)?;
        if let Some(limit) = self.employer_match_limit {
            check_rate(CONTEXT, "employer_match_limit", limit, 0.0, 1.0)?;
        }
        if let Some(salary) = self.annual_salary {
            check_amount(CONTEXT, "annual_salary", salary)?;
        }
        check_rate(CONTEXT, "salary_growth_rate", self.salary_growth_rate, -0.5, 1.0)?;
        check_rate(CONTEXT, "expected_return", self.expected_return, MIN_ANNUAL_RETURN, MAX_ANNUAL_RETURN)?;
        Ok(years)
    }

    /// Employer contribution for one month given the current personal contribution and salary
    fn monthly_employer_match(&self, contribution: f64, salary: Option<f64>) -> f64 {
        let matched_base = match (self.employer_match_limit, salary) {
            (Some(limit), Some(salary)) => contribution.min(limit * salary / 12.0),
            _ => contribution,
        };
        self.employer_match_rate * matched_base
    }
}

/// Derived results of the accumulation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulationMetrics {
    pub years_contributed: u32,
    pub total_personal_contributions: f64,
    pub total_employer_contributions: f64,
    pub investment_gains: f64,
    /// Personal monthly contribution after the last annual raise
    pub final_monthly_contribution: f64,
    /// 4% of the final balance
    pub sustainable_annual_income: f64,
}

pub(super) fn run(
    start: &FinancialState,
    params: &AccumulationParams,
    market: Option<MarketPath<'_>>,
) -> Result<PhaseReport> {
    let years = params.validate()?;
    check_horizon(CONTEXT, start.age, years)?;
    let rates = YearRates::new(years, params.expected_return, 0.0, market)?;
    let salary_step = 1.0 + params.salary_growth_rate;

    let mut balance = start.portfolio_value;
    let mut contribution = params.monthly_contribution;
    let mut salary = params.annual_salary;
    let mut total_personal = 0.0;
    let mut total_employer = 0.0;
    let mut investment_gains = 0.0;
    let mut trajectory = Vec::with_capacity(years as usize);

    for idx in 0..years {
        let annual_return = rates.annual_return(idx);
        let monthly_rate = annual_return / 12.0;
        let mut snap = YearSnapshot::new(idx + 1, start.age + idx, annual_return, balance);

        let employer_match = params.monthly_employer_match(contribution, salary);
        let monthly_inflow = contribution + employer_match;
        let paid_in = monthly_inflow * 12.0;

        let ending = (balance * (1.0 + monthly_rate).powi(12)
            + monthly_inflow * annuity_due_year_factor(monthly_rate))
        .max(0.0);

        snap.contributions = paid_in;
        snap.growth = ending - balance - paid_in;
        snap.ending_balance = ending;

        total_personal += contribution * 12.0;
        total_employer += employer_match * 12.0;
        investment_gains += snap.growth;
        balance = ending;
        trajectory.push(snap);

        // Raise takes effect from the following year
        contribution *= salary_step;
        salary = salary.map(|s| s * salary_step);
    }

    let end_state = FinancialState {
        age: start.age + years,
        portfolio_value: balance,
        cumulative_contributions: start.cumulative_contributions + total_personal + total_employer,
        cumulative_withdrawals: start.cumulative_withdrawals,
    };

    log::debug!(
        "accumulation: {} years from age {}, ending balance {:.2}",
        years,
        start.age,
        balance
    );

    Ok(PhaseReport {
        kind: PhaseKind::Accumulation,
        start_state: *start,
        end_state,
        trajectory,
        metrics: PhaseMetrics::Accumulation(AccumulationMetrics {
            years_contributed: years,
            total_personal_contributions: total_personal,
            total_employer_contributions: total_employer,
            investment_gains,
            final_monthly_contribution: contribution,
            sustainable_annual_income: safe_annual_withdrawal(balance),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::formulas::{future_value_annuity_due, future_value_lump_sum};
    use approx::assert_relative_eq;

    fn params(expected_return: f64) -> AccumulationParams {
        AccumulationParams {
            start_age: 30,
            duration_years: 35,
            current_savings: 0.0,
            monthly_contribution: 500.0,
            employer_match_rate: 0.5,
            employer_match_limit: None,
            annual_salary: None,
            salary_growth_rate: 0.0,
            expected_return,
        }
    }

    fn metrics(report: &PhaseReport) -> &AccumulationMetrics {
        match &report.metrics {
            PhaseMetrics::Accumulation(m) => m,
            other => panic!("unexpected metrics {:?}", other),
        }
    }

    #[test]
    fn test_matches_annuity_due_formula() {
        // Age 30 for 35 years, $500/month plus 50% match, 7%, no salary growth
        let p = params(0.07);
        let report = run(&p.initial_state(), &p, None).unwrap();

        let expected = future_value_annuity_due(750.0, 0.07, 35);
        let actual = report.end_state.portfolio_value;
        assert!(
            ((actual - expected) / expected).abs() < 1e-4,
            "actual {} vs formula {}",
            actual,
            expected
        );
        assert!((actual - 1_358_670.56).abs() < 1.0, "FV: {}", actual);
        assert_eq!(report.end_state.age, 65);
        assert_eq!(report.trajectory.len(), 35);
    }

    #[test]
    fn test_match_limit_against_salary() {
        // 50% match up to 6% of a $60,000 salary: matched base capped at $300/month
        let mut p = params(0.0);
        p.employer_match_limit = Some(0.06);
        p.annual_salary = Some(60_000.0);
        p.duration_years = 1;

        let report = run(&p.initial_state(), &p, None).unwrap();
        let m = metrics(&report);
        assert_relative_eq!(m.total_personal_contributions, 6_000.0);
        assert_relative_eq!(m.total_employer_contributions, 1_800.0);
        assert_relative_eq!(report.end_state.portfolio_value, 7_800.0);
        assert_relative_eq!(report.end_state.cumulative_contributions, 7_800.0);
    }

    #[test]
    fn test_lump_sum_only() {
        let mut p = params(0.06);
        p.current_savings = 50_000.0;
        p.monthly_contribution = 0.0;
        p.duration_years = 20;

        let report = run(&p.initial_state(), &p, None).unwrap();
        assert_relative_eq!(
            report.end_state.portfolio_value,
            future_value_lump_sum(50_000.0, 0.06, 20),
            max_relative = 1e-10
        );
        assert_relative_eq!(metrics(&report).investment_gains, report.end_state.portfolio_value - 50_000.0, max_relative = 1e-10);
    }

    #[test]
    fn test_salary_growth_raises_contributions() {
        let mut p = params(0.0);
        p.employer_match_rate = 0.0;
        p.salary_growth_rate = 0.10;
        p.duration_years = 3;

        let report = run(&p.initial_state(), &p, None).unwrap();
        let m = metrics(&report);
        // 500, 550, 605 per month, then raised to 665.50 after the last year
        assert_relative_eq!(m.total_personal_contributions, 12.0 * (500.0 + 550.0 + 605.0), max_relative = 1e-12);
        assert_relative_eq!(m.final_monthly_contribution, 665.5, max_relative = 1e-12);
        assert_relative_eq!(report.trajectory[1].contributions, 6_600.0, max_relative = 1e-12);
    }

    #[test]
    fn test_higher_return_never_lowers_final_value() {
        let mut previous = 0.0;
        for step in 0..=20 {
            let rate = -0.2 + step as f64 * 0.02;
            let p = params(rate);
            let value = run(&p.initial_state(), &p, None).unwrap().end_state.portfolio_value;
            assert!(value >= previous, "rate {} gave {} < {}", rate, value, previous);
            previous = value;
        }
    }

    #[test]
    fn test_tiny_return_keeps_contributions() {
        let at_zero = run(&params(0.0).initial_state(), &params(0.0), None).unwrap();
        assert_relative_eq!(at_zero.end_state.portfolio_value, 315_000.0, max_relative = 1e-12);

        let p = params(1e-16);
        let tiny = run(&p.initial_state(), &p, None).unwrap().end_state.portfolio_value;
        assert!(
            tiny >= at_zero.end_state.portfolio_value,
            "{} < {}",
            tiny,
            at_zero.end_state.portfolio_value
        );

        // Rounding residue from rate arithmetic
        let p = params(0.3 - 0.1 - 0.2);
        let residue = run(&p.initial_state(), &p, None).unwrap().end_state.portfolio_value;
        assert_relative_eq!(residue, 315_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_market_path_replaces_expected_return() {
        let mut p = params(0.07);
        p.duration_years = 2;
        p.monthly_contribution = 0.0;
        p.current_savings = 1_000.0;
        let returns = [0.12, 0.0];

        let report = run(&p.initial_state(), &p, Some(MarketPath::new(&returns))).unwrap();
        assert_eq!(report.trajectory[0].annual_return, 0.12);
        assert_relative_eq!(report.end_state.portfolio_value, 1_000.0 * 1.01f64.powi(12), max_relative = 1e-12);
    }

    #[test]
    fn test_worst_return_keeps_balance_non_negative() {
        let mut p = params(0.07);
        p.duration_years = 1;
        p.current_savings = 10_000.0;
        let returns = [-1.0];

        let report = run(&p.initial_state(), &p, Some(MarketPath::new(&returns))).unwrap();
        assert!(report.end_state.portfolio_value >= 0.0);
        assert!(report.trajectory.iter().all(|y| y.ending_balance >= 0.0));
    }

    #[test]
    fn test_rejects_return_below_total_loss() {
        let p = params(-1.5);
        let err = run(&p.initial_state(), &p, None).unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameter { field: "expected_return", .. }));
    }

    #[test]
    fn test_zero_years() {
        let mut p = params(0.07);
        p.duration_years = 0;
        p.current_savings = 12_345.0;
        let start = p.initial_state();
        let report = run(&start, &p, None).unwrap();
        assert_eq!(report.end_state, start);
        assert!(report.trajectory.is_empty());
        assert_eq!(metrics(&report).final_monthly_contribution, 500.0);
    }
}
