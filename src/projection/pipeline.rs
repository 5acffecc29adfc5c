//! Chains the four phases into one projection
//!
//! Each phase starts from the state the previous phase ended in. Only the
//! accumulation phase's starting values come from the caller.

use crate::error::{PlanError, Result};
use crate::phases::{FinancialState, PhaseParameters};
use crate::plan::RetirementPlan;

use super::result::ProjectionResult;
use super::sequence::ReturnSequence;

/// Validated, reusable projection over a fixed plan
///
/// Holds no mutable state, so one pipeline can be shared by any number of
/// concurrent runs.
#[derive(Debug, Clone)]
pub struct ProjectionPipeline {
    phases: [PhaseParameters; 4],
    durations: [u32; 4],
    initial_state: FinancialState,
}

impl ProjectionPipeline {
    /// Validate every phase up front; nothing runs if any phase is invalid
    pub fn new(plan: &RetirementPlan) -> Result<Self> {
        let durations = plan.phase_durations()?;
        Ok(Self {
            phases: plan.phases(),
            durations,
            initial_state: plan.accumulation.initial_state(),
        })
    }

    /// Phase lengths in years, in pipeline order
    pub fn durations(&self) -> [u32; 4] {
        self.durations
    }

    /// Total years a return sequence must cover
    pub fn horizon_years(&self) -> u32 {
        self.durations.iter().sum()
    }

    pub fn initial_state(&self) -> FinancialState {
        self.initial_state
    }

    /// Deterministic projection using each phase's expected rates
    pub fn project(&self) -> Result<ProjectionResult> {
        self.run(None)
    }

    /// Projection driven by an explicit per-year return sequence
    pub fn project_with(&self, sequence: &ReturnSequence) -> Result<ProjectionResult> {
        self.check_sequence(sequence)?;
        self.run(Some(sequence))
    }

    fn check_sequence(&self, sequence: &ReturnSequence) -> Result<()> {
        let expected = self.horizon_years() as usize;
        let lengths = std::iter::once(sequence.returns.len()).chain(sequence.inflation.as_ref().map(Vec::len));
        for actual in lengths {
            if actual != expected {
                return Err(PlanError::SequenceLength { expected, actual });
            }
        }
        Ok(())
    }

    fn run(&self, sequence: Option<&ReturnSequence>) -> Result<ProjectionResult> {
        let mut state = self.initial_state;
        let mut offset = 0usize;
        let mut reports = Vec::with_capacity(self.phases.len());

        for (i, (phase, &years)) in self.phases.iter().zip(self.durations.iter()).enumerate() {
            if i > 0 {
                if let Some(hint) = phase.starting_state() {
                    if hint != state {
                        log::warn!(
                            "Ignoring supplied starting state for {} phase; using state carried from the previous phase",
                            phase.kind()
                        );
                    }
                }
            }

            let market = sequence.map(|seq| seq.window(offset, years as usize));
            let report = phase.run(&state, market)?;
            log::debug!(
                "{} phase: age {} -> {}, balance {:.2} -> {:.2}",
                phase.kind(),
                report.start_state.age,
                report.end_state.age,
                report.start_state.portfolio_value,
                report.end_state.portfolio_value
            );
            state = report.end_state;
            offset += years as usize;
            reports.push(report);
        }

        Ok(ProjectionResult {
            phases: reports,
            final_state: state,
        })
    }
}

/// Run a plan once with its expected rates
pub fn project_plan(plan: &RetirementPlan) -> Result<ProjectionResult> {
    ProjectionPipeline::new(plan)?.project()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::{FinancialState, PhaseKind};
    use approx::assert_relative_eq;

    #[test]
    fn test_phases_chain_end_state_to_start_state() {
        let plan = RetirementPlan::example();
        let result = project_plan(&plan).unwrap();

        assert_eq!(result.phases.len(), 4);
        for pair in result.phases.windows(2) {
            assert_eq!(pair[0].end_state, pair[1].start_state);
        }
        assert_eq!(result.final_state, result.phases[3].end_state);
        assert_eq!(result.final_state.age, 95);
        assert_eq!(result.total_years(), 65);
    }

    #[test]
    fn test_caller_starting_state_for_later_phases_is_ignored() {
        let mut plan = RetirementPlan::example();
        plan.active_retirement.starting_state = Some(FinancialState::new(20, 1.0));
        let with_hint = project_plan(&plan).unwrap();
        let without = project_plan(&RetirementPlan::example()).unwrap();
        assert_eq!(with_hint.final_state, without.final_state);
        assert_eq!(
            with_hint.phase(PhaseKind::ActiveRetirement).unwrap().start_state,
            with_hint.phase(PhaseKind::PhasedRetirement).unwrap().end_state
        );
    }

    #[test]
    fn test_deterministic_runs_are_identical() {
        let plan = RetirementPlan::example();
        let a = project_plan(&plan).unwrap();
        let b = project_plan(&plan).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.portfolio_trajectory().iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.portfolio_trajectory().iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_expected_rate_sequence_matches_deterministic_run() {
        let plan = RetirementPlan::example();
        let pipeline = ProjectionPipeline::new(&plan).unwrap();
        let durations = pipeline.durations();
        let returns: Vec<f64> = plan
            .expected_returns()
            .iter()
            .zip(durations.iter())
            .flat_map(|(&rate, &years)| std::iter::repeat(rate).take(years as usize))
            .collect();

        let replayed = pipeline.project_with(&ReturnSequence::new(returns)).unwrap();
        assert_eq!(replayed, pipeline.project().unwrap());
    }

    #[test]
    fn test_each_phase_consumes_its_own_years() {
        let plan = RetirementPlan::example();
        let pipeline = ProjectionPipeline::new(&plan).unwrap();
        let horizon = pipeline.horizon_years() as usize;
        let returns: Vec<f64> = (0..horizon).map(|i| i as f64 / 1_000.0).collect();

        let result = pipeline.project_with(&ReturnSequence::new(returns)).unwrap();
        let applied: Vec<f64> = result.years().map(|y| y.annual_return).collect();
        let expected: Vec<f64> = (0..horizon).map(|i| i as f64 / 1_000.0).collect();
        assert_eq!(applied, expected);
    }

    #[test]
    fn test_sequence_length_mismatch() {
        let pipeline = ProjectionPipeline::new(&RetirementPlan::example()).unwrap();
        let err = pipeline.project_with(&ReturnSequence::constant(0.05, 10)).unwrap_err();
        assert_eq!(err, PlanError::SequenceLength { expected: 65, actual: 10 });

        let short_inflation = ReturnSequence::with_inflation(vec![0.05; 65], vec![0.02; 64]);
        let err = pipeline.project_with(&short_inflation).unwrap_err();
        assert_eq!(err, PlanError::SequenceLength { expected: 65, actual: 64 });
    }

    #[test]
    fn test_invalid_phase_fails_before_anything_runs() {
        let mut plan = RetirementPlan::example();
        plan.late_retirement.expected_return = -2.0;
        assert!(matches!(
            ProjectionPipeline::new(&plan),
            Err(PlanError::InvalidParameter { context: "late retirement", .. })
        ));
    }

    #[test]
    fn test_zero_length_middle_phases_pass_state_through() {
        let mut plan = RetirementPlan::example();
        plan.phased_retirement.duration_years = 0;
        plan.active_retirement.duration_years = 0;
        plan.late_retirement.life_expectancy = 70;

        let result = project_plan(&plan).unwrap();
        let accumulation_end = result.phases[0].end_state;
        assert_eq!(result.phases[1].end_state, accumulation_end);
        assert_eq!(result.phases[2].end_state, accumulation_end);
        assert_eq!(result.phases[3].start_state, accumulation_end);
        assert_eq!(result.phases[3].trajectory.len(), 8);
    }

    #[test]
    fn test_summary_totals() {
        let result = project_plan(&RetirementPlan::example()).unwrap();
        let summary = result.summary();
        assert_eq!(summary.start_age, 30);
        assert_eq!(summary.end_age, 95);
        assert_relative_eq!(summary.final_balance, result.final_state.portfolio_value);
        assert_relative_eq!(
            summary.balance_at_retirement,
            result.phases[0].end_state.portfolio_value
        );
        assert!(summary.peak_balance >= summary.balance_at_retirement);
        assert!(result.portfolio_trajectory().iter().all(|&v| v >= 0.0));
    }
}
