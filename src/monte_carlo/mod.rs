//! Monte Carlo plan survival analysis
//!
//! Re-runs the projection pipeline with randomized annual returns (and
//! optionally inflation) to estimate how likely a plan is to last.

mod config;
mod sampler;
mod outcome;
mod engine;

pub use config::{
    DistributionShape, ReturnDistribution, ReturnModel, SimulationConfig, SuccessCriterion, DEFAULT_HISTOGRAM_BINS,
    DEFAULT_PERCENTILES, DEFAULT_TRIAL_COUNT, DEFAULT_VOLATILITY, MAX_VOLATILITY,
};
pub use sampler::{INFLATION_FLOOR, RETURN_FLOOR};
pub use outcome::TrialOutcome;
pub use engine::{simulate, MonteCarloEngine, SimulationRun};
