//! Consolidated output of one deterministic projection

use serde::{Deserialize, Serialize};

use crate::phases::{FinancialState, LegacyOutcome, PhaseKind, PhaseMetrics, PhaseReport, YearSnapshot};

/// The four phase reports of a projection plus the final state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Phase reports in pipeline order
    pub phases: Vec<PhaseReport>,

    /// State at the end of the last phase
    pub final_state: FinancialState,
}

impl ProjectionResult {
    pub fn phase(&self, kind: PhaseKind) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.kind == kind)
    }

    /// Every projected year across all phases, in order
    pub fn years(&self) -> impl Iterator<Item = &YearSnapshot> {
        self.phases.iter().flat_map(|p| p.trajectory.iter())
    }

    /// End-of-year portfolio value for every projected year
    pub fn portfolio_trajectory(&self) -> Vec<f64> {
        self.years().map(|y| y.ending_balance).collect()
    }

    pub fn total_years(&self) -> u32 {
        self.phases.iter().map(|p| p.duration_years()).sum()
    }

    /// Age at which the portfolio first ran out, in any phase
    pub fn depletion_age(&self) -> Option<u32> {
        self.phases.iter().find_map(|p| p.depletion_age())
    }

    pub fn legacy(&self) -> Option<LegacyOutcome> {
        self.phases.iter().find_map(|p| match &p.metrics {
            PhaseMetrics::LateRetirement(m) => Some(m.legacy),
            _ => None,
        })
    }

    /// Headline figures for display
    pub fn summary(&self) -> ProjectionSummary {
        let starting_balance = self.phases.first().map(|p| p.start_state.portfolio_value).unwrap_or(0.0);
        let balance_at_retirement = self
            .phase(PhaseKind::Accumulation)
            .map(|p| p.end_state.portfolio_value)
            .unwrap_or(starting_balance);
        let peak_balance = self.years().map(|y| y.ending_balance).fold(starting_balance, f64::max);
        let total_shortfall: f64 = self.years().map(|y| y.shortfall).sum();
        let legacy = self.legacy();

        ProjectionSummary {
            start_age: self.phases.first().map(|p| p.start_state.age).unwrap_or(self.final_state.age),
            end_age: self.final_state.age,
            total_years: self.total_years(),
            starting_balance,
            balance_at_retirement,
            peak_balance,
            final_balance: self.final_state.portfolio_value,
            total_contributions: self.final_state.cumulative_contributions,
            total_withdrawals: self.final_state.cumulative_withdrawals,
            total_shortfall,
            depletion_age: self.depletion_age(),
            legacy_surplus: legacy.map(|l| l.surplus),
            legacy_met: legacy.map_or(true, |l| l.is_met()),
        }
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub start_age: u32,
    pub end_age: u32,
    pub total_years: u32,
    pub starting_balance: f64,
    /// Balance at the end of the accumulation phase
    pub balance_at_retirement: f64,
    pub peak_balance: f64,
    pub final_balance: f64,
    pub total_contributions: f64,
    pub total_withdrawals: f64,
    pub total_shortfall: f64,
    pub depletion_age: Option<u32>,
    pub legacy_surplus: Option<f64>,
    pub legacy_met: bool,
}
