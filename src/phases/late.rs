//! Late retirement: rising healthcare, long-term care, and the legacy left behind
//!
//! Runs from the phase start age to the life expectancy horizon with the same
//! growth / withdrawal / clamp rules as active retirement. Long-term-care cost is
//! reduced by insurance: each covered year pays `min(benefit cap, LTC cost)`.

use serde::{Deserialize, Serialize};

use super::drawdown::Drawdown;
use super::market::{MarketPath, YearRates};
use super::report::{PhaseMetrics, PhaseReport};
use super::state::{FinancialState, YearSnapshot};
use super::{PhaseKind, MAX_ANNUAL_RETURN, MAX_INFLATION_RATE, MIN_ANNUAL_RETURN, MIN_INFLATION_RATE};
use crate::error::{check_age, check_amount, check_rate, PlanError, Result};

const CONTEXT: &str = "late retirement";

/// Long-term-care insurance policy terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtcInsurance {
    /// Maximum benefit paid per year
    pub annual_benefit_cap: f64,

    /// Years of care paid out of pocket before benefits start
    #[serde(default)]
    pub elimination_years: u32,

    /// Years benefits are paid once they start; `None` pays for life
    #[serde(default)]
    pub benefit_years: Option<u32>,

    /// Whether the cap rises with inflation
    #[serde(default)]
    pub inflation_protected: bool,
}

impl LtcInsurance {
    /// Whether benefits are paid in the given year of care (0 = first year of care)
    fn pays_in(&self, year_of_care: u32) -> bool {
        if year_of_care < self.elimination_years {
            return false;
        }
        match self.benefit_years {
            Some(limit) => year_of_care - self.elimination_years < limit,
            None => true,
        }
    }

    /// Insurance payout toward one year's LTC cost
    fn coverage(&self, ltc_cost: f64, year_of_care: u32, price_level: f64) -> f64 {
        if !self.pays_in(year_of_care) {
            return 0.0;
        }
        let cap = if self.inflation_protected {
            self.annual_benefit_cap * price_level
        } else {
            self.annual_benefit_cap
        };
        cap.min(ltc_cost)
    }
}

/// Inputs for the late retirement phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateRetirementParams {
    /// Used only when the phase runs on its own; a pipeline replaces it
    #[serde(default)]
    pub starting_state: Option<FinancialState>,

    /// Age the plan must last to; the phase ends here
    pub life_expectancy: u32,

    pub annual_basic_expenses: f64,

    #[serde(default)]
    pub annual_healthcare_costs: f64,

    /// Long-term-care cost per year of care, in phase-start money
    #[serde(default)]
    pub annual_ltc_cost: f64,

    /// Age care starts; `None` means from the start of the phase
    #[serde(default)]
    pub ltc_onset_age: Option<u32>,

    #[serde(default)]
    pub ltc_insurance: Option<LtcInsurance>,

    #[serde(default)]
    pub social_security_income: f64,

    pub expected_return: f64,

    pub inflation_rate: f64,

    /// Balance the plan intends to leave to heirs
    #[serde(default)]
    pub legacy_target: f64,
}

impl LateRetirementParams {
    /// Validate the parameters and return the horizon length from `start_age`
    pub fn validate(&self, start_age: u32) -> Result<u32> {
        check_age(CONTEXT, "life_expectancy", self.life_expectancy)?;
        if self.life_expectancy < start_age {
            return Err(PlanError::invalid(
                CONTEXT,
                "life_expectancy",
                format!(
                    "life expectancy {} is before the phase start age {}",
                    self.life_expectancy, start_age
                ),
            ));
        }
        check_amount(CONTEXT, "annual_basic_expenses", self.annual_basic_expenses)?;
        check_amount(CONTEXT, "annual_healthcare_costs", self.annual_healthcare_costs)?;
        check_amount(CONTEXT, "annual_ltc_cost", self.annual_ltc_cost)?;
        if let Some(insurance) = &self.ltc_insurance {
            check_amount(CONTEXT, "ltc_insurance.annual_benefit_cap", insurance.annual_benefit_cap)?;
        }
        check_amount(CONTEXT, "social_security_income", self.social_security_income)?;
        check_rate(CONTEXT, "expected_return", self.expected_return, MIN_ANNUAL_RETURN, MAX_ANNUAL_RETURN)?;
        check_rate(CONTEXT, "inflation_rate", self.inflation_rate, MIN_INFLATION_RATE, MAX_INFLATION_RATE)?;
        check_amount(CONTEXT, "legacy_target", self.legacy_target)?;
        Ok(self.life_expectancy - start_age)
    }

    /// Year of care for the given age, `None` before care starts
    fn year_of_care(&self, age: u32, phase_start_age: u32) -> Option<u32> {
        let onset = self.ltc_onset_age.unwrap_or(phase_start_age);
        age.checked_sub(onset)
    }
}

/// Final balance compared with the legacy target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyOutcome {
    pub target: f64,
    pub final_balance: f64,
    /// Final balance minus target; negative is a shortfall
    pub surplus: f64,
}

impl LegacyOutcome {
    pub fn new(target: f64, final_balance: f64) -> Self {
        Self {
            target,
            final_balance,
            surplus: final_balance - target,
        }
    }

    pub fn is_met(&self) -> bool {
        self.surplus >= 0.0
    }

    pub fn shortfall(&self) -> f64 {
        (-self.surplus).max(0.0)
    }
}

/// Derived results of the late retirement phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateRetirementMetrics {
    pub total_withdrawals: f64,
    pub total_ltc_costs: f64,
    pub total_ltc_insurance_paid: f64,
    pub net_ltc_out_of_pocket: f64,
    pub total_social_security: f64,
    /// Share of LTC cost paid by insurance; absent when there was no LTC cost
    pub ltc_coverage_ratio: Option<f64>,
    pub total_shortfall: f64,
    pub depletion_age: Option<u32>,
    pub legacy: LegacyOutcome,
    /// Final balance meets the legacy target
    pub portfolio_sufficient: bool,
}

pub(super) fn run(
    start: &FinancialState,
    params: &LateRetirementParams,
    market: Option<MarketPath<'_>>,
) -> Result<PhaseReport> {
    let years = params.validate(start.age)?;
    let rates = YearRates::new(years, params.expected_return, params.inflation_rate, market)?;

    let mut drawdown = Drawdown::new(start.portfolio_value);
    let mut price_level = 1.0;
    let mut total_withdrawals = 0.0;
    let mut total_ltc_costs = 0.0;
    let mut total_ltc_insurance_paid = 0.0;
    let mut total_shortfall = 0.0;
    let mut trajectory = Vec::with_capacity(years as usize);

    for idx in 0..years {
        let age = start.age + idx;
        let mut snap = YearSnapshot::new(idx + 1, age, rates.annual_return(idx), drawdown.balance());

        let (ltc_cost, coverage) = match params.year_of_care(age, start.age) {
            Some(year_of_care) => {
                let cost = params.annual_ltc_cost * price_level;
                let paid = params
                    .ltc_insurance
                    .as_ref()
                    .map_or(0.0, |policy| policy.coverage(cost, year_of_care, price_level));
                (cost, paid)
            }
            None => (0.0, 0.0),
        };
        let out_of_pocket = ltc_cost - coverage;
        let costs = (params.annual_basic_expenses + params.annual_healthcare_costs) * price_level + out_of_pocket;
        let need = (costs - params.social_security_income).max(0.0);

        snap.income = params.social_security_income;
        drawdown.step(&mut snap, 0.0, need);

        total_withdrawals += snap.withdrawal;
        total_shortfall += snap.shortfall;
        total_ltc_costs += ltc_cost;
        total_ltc_insurance_paid += coverage;
        trajectory.push(snap);

        price_level *= 1.0 + rates.inflation(idx);
    }

    let final_balance = drawdown.balance();
    let legacy = LegacyOutcome::new(params.legacy_target, final_balance);
    let metrics = LateRetirementMetrics {
        total_withdrawals,
        total_ltc_costs,
        total_ltc_insurance_paid,
        net_ltc_out_of_pocket: total_ltc_costs - total_ltc_insurance_paid,
        total_social_security: params.social_security_income * years as f64,
        ltc_coverage_ratio: (total_ltc_costs > 0.0).then(|| total_ltc_insurance_paid / total_ltc_costs),
        total_shortfall,
        depletion_age: drawdown.depleted_in_year().map(|year| start.age + year - 1),
        legacy,
        portfolio_sufficient: legacy.is_met(),
    };

    let end_state = FinancialState {
        age: start.age + years,
        portfolio_value: final_balance,
        cumulative_contributions: start.cumulative_contributions,
        cumulative_withdrawals: start.cumulative_withdrawals + total_withdrawals,
    };

    log::debug!(
        "late retirement: {} years to age {}, legacy surplus {:.2}",
        years,
        end_state.age,
        legacy.surplus
    );

    Ok(PhaseReport {
        kind: PhaseKind::LateRetirement,
        start_state: *start,
        end_state,
        trajectory,
        metrics: PhaseMetrics::LateRetirement(metrics),
    })
}
