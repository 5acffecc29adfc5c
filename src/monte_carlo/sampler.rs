//! Draws one trial's return (and inflation) sequence

use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};

use super::config::{DistributionShape, ReturnDistribution, SimulationConfig};
use crate::error::{PlanError, Result};
use crate::phases::PhaseKind;
use crate::plan::RetirementPlan;
use crate::projection::ReturnSequence;

/// Worst drawn annual return (total loss)
pub const RETURN_FLOOR: f64 = -1.0;
/// Worst drawn annual inflation
pub const INFLATION_FLOOR: f64 = -0.99;

const CONTEXT: &str = "simulation";

#[derive(Debug, Clone, Copy)]
enum RateSampler {
    Fixed(f64),
    Normal(Normal<f64>),
    /// Draws the growth factor `1 + r`
    LogNormal(LogNormal<f64>),
}

impl RateSampler {
    fn normal(mean: f64, volatility: f64, field: &'static str) -> Result<Self> {
        if volatility == 0.0 {
            return Ok(RateSampler::Fixed(mean));
        }
        Normal::new(mean, volatility)
            .map(RateSampler::Normal)
            .map_err(|e| PlanError::invalid(CONTEXT, field, e.to_string()))
    }

    /// Log-normal growth factor matched to the arithmetic mean and volatility of `r`
    fn log_normal(mean: f64, volatility: f64) -> Result<Self> {
        if volatility == 0.0 {
            return Ok(RateSampler::Fixed(mean));
        }
        let m = 1.0 + mean;
        if m <= 0.0 {
            return Err(PlanError::invalid(
                CONTEXT,
                "mean",
                format!("log-normal returns need a mean above -100% (got {mean})"),
            ));
        }
        let sigma_sq = (1.0 + volatility * volatility / (m * m)).ln();
        let mu = m.ln() - sigma_sq / 2.0;
        LogNormal::new(mu, sigma_sq.sqrt())
            .map(RateSampler::LogNormal)
            .map_err(|e| PlanError::invalid(CONTEXT, "volatility", e.to_string()))
    }

    fn from_distribution(dist: &ReturnDistribution, phase_return: f64) -> Result<Self> {
        let mean = dist.mean.unwrap_or(phase_return);
        match dist.shape {
            DistributionShape::Normal => Self::normal(mean, dist.volatility, "volatility"),
            DistributionShape::LogNormal => Self::log_normal(mean, dist.volatility),
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            RateSampler::Fixed(rate) => *rate,
            RateSampler::Normal(dist) => dist.sample(rng),
            RateSampler::LogNormal(dist) => dist.sample(rng) - 1.0,
        }
    }
}

/// Per-phase samplers laid out over the plan horizon
#[derive(Debug, Clone)]
pub(crate) struct TrialSampler {
    durations: [u32; 4],
    returns: [RateSampler; 4],
    inflation: Option<[RateSampler; 4]>,
}

impl TrialSampler {
    pub(crate) fn new(plan: &RetirementPlan, durations: [u32; 4], config: &SimulationConfig) -> Result<Self> {
        let expected = plan.expected_returns();
        let mut returns = [RateSampler::Fixed(0.0); 4];
        for (i, slot) in returns.iter_mut().enumerate() {
            *slot = RateSampler::from_distribution(config.returns.for_phase(i), expected[i])?;
        }

        let inflation = match config.inflation_volatility {
            Some(volatility) => {
                let rates = plan.inflation_rates();
                let mut samplers = [RateSampler::Fixed(0.0); 4];
                for ((slot, &rate), kind) in samplers.iter_mut().zip(rates.iter()).zip(PhaseKind::ALL) {
                    if kind.has_inflation() {
                        *slot = RateSampler::normal(rate, volatility, "inflation_volatility")?;
                    }
                }
                Some(samplers)
            }
            None => None,
        };

        Ok(Self {
            durations,
            returns,
            inflation,
        })
    }

    pub(crate) fn horizon_years(&self) -> usize {
        self.durations.iter().map(|&d| d as usize).sum()
    }

    /// Draw a full-horizon sequence: every return first, then every inflation rate
    pub(crate) fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> ReturnSequence {
        let returns = self.draw_series(&self.returns, RETURN_FLOOR, rng);
        match &self.inflation {
            Some(samplers) => {
                let inflation = self.draw_series(samplers, INFLATION_FLOOR, rng);
                ReturnSequence::with_inflation(returns, inflation)
            }
            None => ReturnSequence::new(returns),
        }
    }

    fn draw_series<R: Rng + ?Sized>(&self, samplers: &[RateSampler; 4], floor: f64, rng: &mut R) -> Vec<f64> {
        let mut series = Vec::with_capacity(self.horizon_years());
        for (sampler, &years) in samplers.iter().zip(self.durations.iter()) {
            series.extend((0..years).map(|_| sampler.sample(rng).max(floor)));
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::config::ReturnModel;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sampler(config: &SimulationConfig) -> TrialSampler {
        let plan = RetirementPlan::example();
        let durations = plan.phase_durations().unwrap();
        TrialSampler::new(&plan, durations, config).unwrap()
    }

    #[test]
    fn test_zero_volatility_reproduces_expected_returns() {
        let config = SimulationConfig::default().with_returns(ReturnModel::Global(ReturnDistribution::normal(0.0)));
        let seq = sampler(&config).draw(&mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(seq.len(), 65);
        assert!(seq.returns[..32].iter().all(|&r| r == 0.07));
        assert!(seq.returns[32..37].iter().all(|&r| r == 0.06));
        assert!(seq.returns[55..].iter().all(|&r| r == 0.04));
        assert!(seq.inflation.is_none());
    }

    #[test]
    fn test_draws_are_clamped() {
        let config = SimulationConfig {
            returns: ReturnModel::Global(ReturnDistribution::normal(1.0).with_mean(-0.9)),
            inflation_volatility: Some(1.0),
            ..SimulationConfig::default()
        };
        let seq = sampler(&config).draw(&mut ChaCha8Rng::seed_from_u64(3));
        assert!(seq.returns.iter().all(|&r| r >= RETURN_FLOOR));
        assert!(seq.returns.iter().any(|&r| r == RETURN_FLOOR));
        let inflation = seq.inflation.unwrap();
        assert_eq!(inflation.len(), 65);
        assert!(inflation.iter().all(|&i| i >= INFLATION_FLOOR));
    }

    #[test]
    fn test_log_normal_mean_matches_arithmetic_mean() {
        let config = SimulationConfig::default()
            .with_returns(ReturnModel::Global(ReturnDistribution::log_normal(0.15).with_mean(0.07)));
        let sampler = sampler(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut draws = Vec::new();
        for _ in 0..400 {
            draws.extend(sampler.draw(&mut rng).returns);
        }
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!((mean - 0.07).abs() < 0.005, "sample mean {}", mean);
        assert!(draws.iter().all(|&r| r > -1.0));
    }

    #[test]
    fn test_per_phase_distributions_cover_their_own_years() {
        let config = SimulationConfig::default().with_returns(ReturnModel::PerPhase([
            ReturnDistribution::normal(0.0).with_mean(0.01),
            ReturnDistribution::normal(0.0).with_mean(0.02),
            ReturnDistribution::normal(0.0).with_mean(0.03),
            ReturnDistribution::normal(0.0).with_mean(0.04),
        ]));
        let seq = sampler(&config).draw(&mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(seq.len(), 65);
        assert!(seq.returns[..32].iter().all(|&r| r == 0.01));
        assert!(seq.returns[32..37].iter().all(|&r| r == 0.02));
        assert!(seq.returns[37..55].iter().all(|&r| r == 0.03));
        assert!(seq.returns[55..].iter().all(|&r| r == 0.04));
    }

    #[test]
    fn test_per_phase_volatility_only_where_configured() {
        let config = SimulationConfig::default().with_returns(ReturnModel::PerPhase([
            ReturnDistribution::normal(0.0),
            ReturnDistribution::normal(0.0),
            ReturnDistribution::normal(0.2),
            ReturnDistribution::normal(0.0).with_mean(0.0),
        ]));
        let seq = sampler(&config).draw(&mut ChaCha8Rng::seed_from_u64(6));
        assert!(seq.returns[..32].iter().all(|&r| r == 0.07));
        assert!(seq.returns[32..37].iter().all(|&r| r == 0.06));
        assert!(seq.returns[37..55].iter().any(|&r| r != 0.05));
        assert!(seq.returns[55..].iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_inflation_drawn_only_for_inflating_phases() {
        let config = SimulationConfig {
            inflation_volatility: Some(0.5),
            ..SimulationConfig::default()
        };
        let seq = sampler(&config).draw(&mut ChaCha8Rng::seed_from_u64(12));
        let inflation = seq.inflation.unwrap();
        assert_eq!(inflation.len(), 65);
        assert!(inflation[..37].iter().all(|&i| i == 0.0));
        assert!(inflation[37..55].iter().any(|&i| i != 0.025));
        assert!(inflation[55..].iter().any(|&i| i != inflation[55]));
    }

    #[test]
    fn test_same_rng_state_same_draw() {
        let config = SimulationConfig::default();
        let sampler = sampler(&config);
        let a = sampler.draw(&mut ChaCha8Rng::seed_from_u64(9));
        let b = sampler.draw(&mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
