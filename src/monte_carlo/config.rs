//! Simulation settings: trial count, return model, seed and reporting options

use serde::{Deserialize, Serialize};

use crate::error::{check_rate, PlanError, Result};
use crate::phases::{MAX_ANNUAL_RETURN, MIN_ANNUAL_RETURN};

pub const DEFAULT_TRIAL_COUNT: u32 = 10_000;
pub const DEFAULT_VOLATILITY: f64 = 0.10;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
pub const DEFAULT_PERCENTILES: [f64; 5] = [10.0, 25.0, 50.0, 75.0, 90.0];

/// Largest annual standard deviation accepted for returns or inflation
pub const MAX_VOLATILITY: f64 = 1.0;

const CONTEXT: &str = "simulation";

/// Family of the annual return distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionShape {
    /// Returns drawn directly from N(mean, volatility)
    #[default]
    Normal,
    /// Growth factor `1 + r` drawn log-normally with the same mean and volatility
    LogNormal,
}

/// Distribution of one year's return
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnDistribution {
    #[serde(default)]
    pub shape: DistributionShape,

    /// Mean annual return; absent means each phase's expected return
    #[serde(default)]
    pub mean: Option<f64>,

    /// Annual standard deviation
    pub volatility: f64,
}

impl ReturnDistribution {
    pub fn normal(volatility: f64) -> Self {
        Self {
            shape: DistributionShape::Normal,
            mean: None,
            volatility,
        }
    }

    pub fn log_normal(volatility: f64) -> Self {
        Self {
            shape: DistributionShape::LogNormal,
            mean: None,
            volatility,
        }
    }

    pub fn with_mean(mut self, mean: f64) -> Self {
        self.mean = Some(mean);
        self
    }

    fn validate(&self) -> Result<()> {
        check_rate(CONTEXT, "volatility", self.volatility, 0.0, MAX_VOLATILITY)?;
        if let Some(mean) = self.mean {
            check_rate(CONTEXT, "mean", mean, MIN_ANNUAL_RETURN, MAX_ANNUAL_RETURN)?;
        }
        Ok(())
    }
}

impl Default for ReturnDistribution {
    fn default() -> Self {
        Self::normal(DEFAULT_VOLATILITY)
    }
}

/// One distribution for the whole horizon, or one per phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnModel {
    Global(ReturnDistribution),
    /// Distributions in pipeline order
    PerPhase([ReturnDistribution; 4]),
}

impl ReturnModel {
    /// Distribution used for the phase at `index` in pipeline order
    pub fn for_phase(&self, index: usize) -> &ReturnDistribution {
        match self {
            ReturnModel::Global(dist) => dist,
            ReturnModel::PerPhase(dists) => &dists[index.min(dists.len() - 1)],
        }
    }
}

impl Default for ReturnModel {
    fn default() -> Self {
        ReturnModel::Global(ReturnDistribution::default())
    }
}

/// What counts as a successful trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessCriterion {
    /// Portfolio never fully depletes before the horizon ends
    #[default]
    NeverDepleted,
    /// Never depleted and the final balance reaches the legacy target
    LegacyTarget,
}

impl SuccessCriterion {
    pub fn is_success(self, depletion_age: Option<u32>, legacy_met: bool) -> bool {
        match self {
            SuccessCriterion::NeverDepleted => depletion_age.is_none(),
            SuccessCriterion::LegacyTarget => depletion_age.is_none() && legacy_met,
        }
    }
}

/// Monte Carlo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub trial_count: u32,

    pub returns: ReturnModel,

    /// Annual standard deviation of inflation around each phase's rate;
    /// absent means inflation is not randomized
    pub inflation_volatility: Option<f64>,

    /// Base seed; absent means one is drawn and reported with the results
    pub seed: Option<u64>,

    pub success_criterion: SuccessCriterion,

    /// Percentiles (0-100) reported per year and for terminal values
    pub percentiles: Vec<f64>,

    pub histogram_bins: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trial_count: DEFAULT_TRIAL_COUNT,
            returns: ReturnModel::default(),
            inflation_volatility: None,
            seed: None,
            success_criterion: SuccessCriterion::default(),
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl SimulationConfig {
    pub fn with_trials(mut self, trial_count: u32) -> Self {
        self.trial_count = trial_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_returns(mut self, returns: ReturnModel) -> Self {
        self.returns = returns;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.trial_count == 0 {
            return Err(PlanError::EmptyTrialSet);
        }
        match &self.returns {
            ReturnModel::Global(dist) => dist.validate()?,
            ReturnModel::PerPhase(dists) => {
                for dist in dists {
                    dist.validate()?;
                }
            }
        }
        if let Some(vol) = self.inflation_volatility {
            check_rate(CONTEXT, "inflation_volatility", vol, 0.0, MAX_VOLATILITY)?;
        }
        for &p in &self.percentiles {
            check_rate(CONTEXT, "percentiles", p, 0.0, 100.0)?;
        }
        if self.histogram_bins == 0 {
            return Err(PlanError::invalid(CONTEXT, "histogram_bins", "at least one bin is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.trial_count, 10_000);
        assert_eq!(config.success_criterion, SuccessCriterion::NeverDepleted);
        assert_eq!(config.percentiles, vec![10.0, 25.0, 50.0, 75.0, 90.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_trials_is_empty_trial_set() {
        let config = SimulationConfig::default().with_trials(0);
        assert_eq!(config.validate(), Err(PlanError::EmptyTrialSet));
    }

    #[test]
    fn test_rejects_bad_distribution() {
        let config = SimulationConfig::default().with_returns(ReturnModel::Global(ReturnDistribution::normal(-0.1)));
        assert!(matches!(
            config.validate(),
            Err(PlanError::InvalidParameter { field: "volatility", .. })
        ));

        let config = SimulationConfig::default()
            .with_returns(ReturnModel::Global(ReturnDistribution::normal(0.1).with_mean(-1.5)));
        assert!(matches!(config.validate(), Err(PlanError::InvalidParameter { field: "mean", .. })));

        let mut config = SimulationConfig::default();
        config.percentiles = vec![50.0, 101.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let json = r#"{ "trial_count": 500, "seed": 7, "returns": { "global": { "shape": "log_normal", "volatility": 0.12 } } }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.trial_count, 500);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.histogram_bins, DEFAULT_HISTOGRAM_BINS);
        assert_eq!(config.returns.for_phase(3), &ReturnDistribution::log_normal(0.12));
    }

    #[test]
    fn test_success_criteria() {
        assert!(SuccessCriterion::NeverDepleted.is_success(None, false));
        assert!(!SuccessCriterion::NeverDepleted.is_success(Some(80), true));
        assert!(!SuccessCriterion::LegacyTarget.is_success(None, false));
        assert!(SuccessCriterion::LegacyTarget.is_success(None, true));
    }
}
