//! A complete four-phase retirement plan
//!
//! Groups the parameters for every phase in their fixed pipeline order. Only the
//! accumulation phase's starting values are authoritative; the starting states of
//! later phases come from the phase before them.

pub mod loader;

pub use loader::{load_plan_file, parse_plan, LoadError, PlanFile};

use serde::{Deserialize, Serialize};

use crate::error::{check_horizon, Result};
use crate::phases::{
    AccumulationParams, ActiveRetirementParams, LateRetirementParams, LtcInsurance, PhaseParameters,
    PhasedRetirementParams,
};

/// Parameters for all four phases of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementPlan {
    pub accumulation: AccumulationParams,
    pub phased_retirement: PhasedRetirementParams,
    pub active_retirement: ActiveRetirementParams,
    pub late_retirement: LateRetirementParams,
}

impl RetirementPlan {
    /// Phase parameters in pipeline order
    pub fn phases(&self) -> [PhaseParameters; 4] {
        [
            PhaseParameters::Accumulation(self.accumulation.clone()),
            PhaseParameters::PhasedRetirement(self.phased_retirement.clone()),
            PhaseParameters::ActiveRetirement(self.active_retirement.clone()),
            PhaseParameters::LateRetirement(self.late_retirement.clone()),
        ]
    }

    /// Validate every phase and return each phase's length in years
    ///
    /// Phase start ages are derived by chaining durations from the accumulation
    /// start age, so the late retirement horizon is checked against the age the
    /// plan actually reaches.
    pub fn phase_durations(&self) -> Result<[u32; 4]> {
        let mut durations = [0u32; 4];
        let mut age = self.accumulation.start_age;
        for (slot, phase) in durations.iter_mut().zip(self.phases().iter()) {
            let years = phase.duration_years(age)?;
            check_horizon(phase.kind().label(), age, years)?;
            *slot = years;
            age += years;
        }
        Ok(durations)
    }

    /// Total number of projected years across all phases
    pub fn horizon_years(&self) -> Result<u32> {
        Ok(self.phase_durations()?.iter().sum())
    }

    /// Expected annual return of each phase, in pipeline order
    pub fn expected_returns(&self) -> [f64; 4] {
        [
            self.accumulation.expected_return,
            self.phased_retirement.expected_return,
            self.active_retirement.expected_return,
            self.late_retirement.expected_return,
        ]
    }

    /// Assumed inflation of each phase; phases without inflating costs report zero
    pub fn inflation_rates(&self) -> [f64; 4] {
        [0.0, 0.0, self.active_retirement.inflation_rate, self.late_retirement.inflation_rate]
    }

    /// Sample plan: saver aged 30, phased retirement at 62, fully retired at 67, late phase from 85
    pub fn example() -> Self {
        Self {
            accumulation: AccumulationParams {
                start_age: 30,
                duration_years: 32,
                current_savings: 50_000.0,
                monthly_contribution: 1_000.0,
                employer_match_rate: 0.5,
                employer_match_limit: Some(0.06),
                annual_salary: Some(85_000.0),
                salary_growth_rate: 0.02,
                expected_return: 0.07,
            },
            phased_retirement: PhasedRetirementParams {
                starting_state: None,
                duration_years: 5,
                part_time_income: Some(30_000.0),
                annual_contribution: None,
                annual_withdrawal: 60_000.0,
                expected_return: 0.06,
            },
            active_retirement: ActiveRetirementParams {
                starting_state: None,
                duration_years: 18,
                annual_expenses: 60_000.0,
                annual_healthcare_costs: 8_000.0,
                social_security_income: 30_000.0,
                pension_income: 0.0,
                expected_return: 0.05,
                inflation_rate: 0.025,
            },
            late_retirement: LateRetirementParams {
                starting_state: None,
                life_expectancy: 95,
                annual_basic_expenses: 45_000.0,
                annual_healthcare_costs: 15_000.0,
                annual_ltc_cost: 90_000.0,
                ltc_onset_age: Some(90),
                ltc_insurance: Some(LtcInsurance {
                    annual_benefit_cap: 60_000.0,
                    elimination_years: 0,
                    benefit_years: Some(3),
                    inflation_protected: false,
                }),
                social_security_income: 30_000.0,
                expected_return: 0.04,
                inflation_rate: 0.025,
                legacy_target: 100_000.0,
            },
        }
    }
}
