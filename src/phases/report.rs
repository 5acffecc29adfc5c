//! Per-phase output structures

use serde::{Deserialize, Serialize};

use super::accumulation::AccumulationMetrics;
use super::active::ActiveRetirementMetrics;
use super::late::LateRetirementMetrics;
use super::phased::PhasedRetirementMetrics;
use super::state::{FinancialState, YearSnapshot};
use super::PhaseKind;

/// Phase-specific derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseMetrics {
    Accumulation(AccumulationMetrics),
    PhasedRetirement(PhasedRetirementMetrics),
    ActiveRetirement(ActiveRetirementMetrics),
    LateRetirement(LateRetirementMetrics),
}

impl PhaseMetrics {
    /// Age at which the portfolio first hit zero during the phase
    pub fn depletion_age(&self) -> Option<u32> {
        match self {
            PhaseMetrics::Accumulation(_) => None,
            PhaseMetrics::PhasedRetirement(m) => m.depletion_age,
            PhaseMetrics::ActiveRetirement(m) => m.depletion_age,
            PhaseMetrics::LateRetirement(m) => m.depletion_age,
        }
    }
}

/// Complete result of running one phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub kind: PhaseKind,

    /// State the phase started from
    pub start_state: FinancialState,

    /// State handed to the next phase
    pub end_state: FinancialState,

    /// Year-by-year detail, empty for a zero-length phase
    pub trajectory: Vec<YearSnapshot>,

    pub metrics: PhaseMetrics,
}

impl PhaseReport {
    pub fn duration_years(&self) -> u32 {
        self.trajectory.len() as u32
    }

    pub fn depletion_age(&self) -> Option<u32> {
        self.metrics.depletion_age()
    }

    /// Largest single-year shortfall, zero when every need was met
    pub fn max_shortfall(&self) -> f64 {
        self.trajectory.iter().map(|y| y.shortfall).fold(0.0, f64::max)
    }
}
