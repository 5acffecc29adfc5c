//! Life-phase models: accumulation, phased retirement, active retirement, late retirement
//!
//! Every phase shares one contract: given a starting [`FinancialState`], its parameters
//! and (optionally) an explicit market path, produce a [`PhaseReport`]. Phases are pure;
//! randomness only ever arrives through the market path argument.

mod state;
mod market;
mod drawdown;
mod report;
mod accumulation;
mod phased;
mod active;
mod late;

pub use state::{FinancialState, YearSnapshot};
pub use market::MarketPath;
pub use report::{PhaseMetrics, PhaseReport};
pub use accumulation::{AccumulationMetrics, AccumulationParams};
pub use phased::{PhasedRetirementMetrics, PhasedRetirementParams};
pub use active::{ActiveRetirementMetrics, ActiveRetirementParams};
pub use late::{LateRetirementMetrics, LateRetirementParams, LegacyOutcome, LtcInsurance};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Lowest annual return accepted in parameters (total loss)
pub const MIN_ANNUAL_RETURN: f64 = -1.0;
/// Highest annual return accepted in parameters
pub const MAX_ANNUAL_RETURN: f64 = 1.0;
/// Lowest annual inflation rate accepted in parameters
pub const MIN_INFLATION_RATE: f64 = -0.5;
/// Highest annual inflation rate accepted in parameters
pub const MAX_INFLATION_RATE: f64 = 1.0;

/// The four life phases, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Accumulation,
    PhasedRetirement,
    ActiveRetirement,
    LateRetirement,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 4] = [
        PhaseKind::Accumulation,
        PhaseKind::PhasedRetirement,
        PhaseKind::ActiveRetirement,
        PhaseKind::LateRetirement,
    ];

    /// Human-readable name, also used as the error context
    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Accumulation => "accumulation",
            PhaseKind::PhasedRetirement => "phased retirement",
            PhaseKind::ActiveRetirement => "active retirement",
            PhaseKind::LateRetirement => "late retirement",
        }
    }

    /// Whether the phase's costs grow with inflation
    pub fn has_inflation(self) -> bool {
        matches!(self, PhaseKind::ActiveRetirement | PhaseKind::LateRetirement)
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameters for one phase, tagged by phase kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseParameters {
    Accumulation(AccumulationParams),
    PhasedRetirement(PhasedRetirementParams),
    ActiveRetirement(ActiveRetirementParams),
    LateRetirement(LateRetirementParams),
}

impl PhaseParameters {
    pub fn kind(&self) -> PhaseKind {
        match self {
            PhaseParameters::Accumulation(_) => PhaseKind::Accumulation,
            PhaseParameters::PhasedRetirement(_) => PhaseKind::PhasedRetirement,
            PhaseParameters::ActiveRetirement(_) => PhaseKind::ActiveRetirement,
            PhaseParameters::LateRetirement(_) => PhaseKind::LateRetirement,
        }
    }

    /// Validate the parameters and return the phase length in years
    ///
    /// `start_age` is the age at which the phase begins; only the late
    /// retirement horizon (an absolute life expectancy) depends on it.
    pub fn duration_years(&self, start_age: u32) -> Result<u32> {
        match self {
            PhaseParameters::Accumulation(p) => p.validate(),
            PhaseParameters::PhasedRetirement(p) => p.validate(),
            PhaseParameters::ActiveRetirement(p) => p.validate(),
            PhaseParameters::LateRetirement(p) => p.validate(start_age),
        }
    }

    /// Starting state supplied by the caller, if any
    ///
    /// Accumulation always defines one; later phases carry an optional hint
    /// that only matters when the phase is run on its own.
    pub fn starting_state(&self) -> Option<FinancialState> {
        match self {
            PhaseParameters::Accumulation(p) => Some(p.initial_state()),
            PhaseParameters::PhasedRetirement(p) => p.starting_state,
            PhaseParameters::ActiveRetirement(p) => p.starting_state,
            PhaseParameters::LateRetirement(p) => p.starting_state,
        }
    }

    /// Run the phase from `start`
    ///
    /// Without a market path each year uses the phase's expected return and
    /// inflation rate. With one, the path must cover exactly this phase's years.
    pub fn run(&self, start: &FinancialState, market: Option<MarketPath<'_>>) -> Result<PhaseReport> {
        match self {
            PhaseParameters::Accumulation(p) => accumulation::run(start, p, market),
            PhaseParameters::PhasedRetirement(p) => phased::run(start, p, market),
            PhaseParameters::ActiveRetirement(p) => active::run(start, p, market),
            PhaseParameters::LateRetirement(p) => late::run(start, p, market),
        }
    }
}

/// Deterministic single-phase run using the phase's expected rates
pub fn run_phase(start: &FinancialState, params: &PhaseParameters) -> Result<PhaseReport> {
    params.run(start, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;

    fn active(duration_years: i32) -> PhaseParameters {
        PhaseParameters::ActiveRetirement(ActiveRetirementParams {
            starting_state: None,
            duration_years,
            annual_expenses: 40_000.0,
            annual_healthcare_costs: 5_000.0,
            social_security_income: 20_000.0,
            pension_income: 0.0,
            expected_return: 0.05,
            inflation_rate: 0.03,
        })
    }

    #[test]
    fn test_dispatch_by_kind() {
        let params = active(10);
        assert_eq!(params.kind(), PhaseKind::ActiveRetirement);
        let report = run_phase(&FinancialState::new(70, 500_000.0), &params).unwrap();
        assert_eq!(report.kind, PhaseKind::ActiveRetirement);
        assert_eq!(report.trajectory.len(), 10);
        assert!(matches!(report.metrics, PhaseMetrics::ActiveRetirement(_)));
    }

    #[test]
    fn test_only_retirement_phases_inflate() {
        let inflating: Vec<_> = PhaseKind::ALL.into_iter().filter(|k| k.has_inflation()).collect();
        assert_eq!(inflating, [PhaseKind::ActiveRetirement, PhaseKind::LateRetirement]);
    }

    #[test]
    fn test_zero_duration_is_identity() {
        let start = FinancialState {
            age: 70,
            portfolio_value: 321_000.0,
            cumulative_contributions: 100_000.0,
            cumulative_withdrawals: 5_000.0,
        };
        let report = run_phase(&start, &active(0)).unwrap();
        assert_eq!(report.end_state, start);
        assert!(report.trajectory.is_empty());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let err = run_phase(&FinancialState::new(70, 1.0), &active(-2)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameter { field: "duration_years", .. }));
    }

    #[test]
    fn test_standalone_run_past_age_limit_rejected() {
        let err = run_phase(&FinancialState::new(u32::MAX - 1, 1_000.0), &active(5)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameter { field: "duration_years", .. }));

        let err = run_phase(&FinancialState::new(70, 1_000.0), &active(i32::MAX)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameter { field: "duration_years", .. }));
    }

    #[test]
    fn test_parameters_deserialize_with_phase_tag() {
        let json = r#"{
            "phase": "phased_retirement",
            "duration_years": 5,
            "annual_withdrawal": 20000.0,
            "expected_return": 0.05
        }"#;
        let params: PhaseParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.kind(), PhaseKind::PhasedRetirement);
        assert_eq!(params.duration_years(60), Ok(5));
        assert_eq!(params.starting_state(), None);
    }
}
