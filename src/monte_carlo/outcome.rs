//! Result of one Monte Carlo trial

use serde::{Deserialize, Serialize};

use super::config::SuccessCriterion;
use crate::phases::FinancialState;
use crate::projection::ProjectionResult;

/// Terminal state and year-by-year balances of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial_index: u32,

    /// Age during the first projected year
    pub start_age: u32,

    pub final_state: FinancialState,

    /// End-of-year portfolio value for every year of the horizon
    pub trajectory: Vec<f64>,

    /// First age at which the portfolio ran out, if it did
    pub depletion_age: Option<u32>,

    /// Final balance reached the legacy target
    pub legacy_met: bool,

    /// Trial counts as a success under the configured criterion
    pub success: bool,
}

impl TrialOutcome {
    pub fn from_projection(trial_index: u32, result: &ProjectionResult, criterion: SuccessCriterion) -> Self {
        let depletion_age = result.depletion_age();
        let legacy_met = result.legacy().map_or(true, |l| l.is_met());
        let start_age = result
            .phases
            .first()
            .map(|p| p.start_state.age)
            .unwrap_or(result.final_state.age);

        Self {
            trial_index,
            start_age,
            final_state: result.final_state,
            trajectory: result.portfolio_trajectory(),
            depletion_age,
            legacy_met,
            success: criterion.is_success(depletion_age, legacy_met),
        }
    }

    pub fn final_value(&self) -> f64 {
        self.final_state.portfolio_value
    }

    pub fn is_depleted(&self) -> bool {
        self.depletion_age.is_some()
    }
}
