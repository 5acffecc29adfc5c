//! Runs the projection pipeline once per trial with drawn market paths
//!
//! Trial `i` draws from its own `ChaCha8Rng` stream (base seed, stream `i`), so
//! results do not depend on how rayon schedules trials across threads.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::SimulationConfig;
use super::outcome::TrialOutcome;
use super::sampler::TrialSampler;
use crate::error::{PlanError, Result};
use crate::plan::RetirementPlan;
use crate::projection::ProjectionPipeline;
use crate::statistics::{SimulationSummary, StatisticsAggregator};

/// Raw trials plus their summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub trials: Vec<TrialOutcome>,
    pub summary: SimulationSummary,
}

/// Monte Carlo simulator over a fixed configuration
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    config: SimulationConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl MonteCarloEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config, cancel: None }
    }

    /// Stop the batch between trials once `token` is set
    pub fn with_cancellation(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run every trial and summarize
    ///
    /// All validation happens before the first trial; a batch either returns
    /// every trial or fails as a whole.
    pub fn simulate(&self, plan: &RetirementPlan) -> Result<SimulationRun> {
        let (trials, seed) = self.run_trials(plan)?;
        let mut summary = StatisticsAggregator::from_config(&self.config).summarize(&trials)?;
        summary.seed = Some(seed);

        log::info!(
            "Simulation finished: {}/{} trials succeeded ({:.1}%)",
            summary.success_count,
            summary.trial_count,
            summary.success_probability * 100.0
        );

        Ok(SimulationRun { trials, summary })
    }

    /// Run every trial without summarizing; returns the trials and the base seed used
    pub fn run_trials(&self, plan: &RetirementPlan) -> Result<(Vec<TrialOutcome>, u64)> {
        self.config.validate()?;
        let pipeline = ProjectionPipeline::new(plan)?;
        let sampler = TrialSampler::new(plan, pipeline.durations(), &self.config)?;

        let seed = self.config.seed.unwrap_or_else(rand::random::<u64>);
        let requested = self.config.trial_count;
        let criterion = self.config.success_criterion;
        let completed = AtomicU32::new(0);

        log::info!(
            "Running {} trials over {} years (seed {})",
            requested,
            pipeline.horizon_years(),
            seed
        );

        let trials = (0..requested)
            .into_par_iter()
            .map(|trial_index| -> Result<TrialOutcome> {
                if self.is_cancelled() {
                    return Err(PlanError::Cancelled {
                        completed: completed.load(Ordering::Relaxed),
                        requested,
                    });
                }

                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(u64::from(trial_index));
                let sequence = sampler.draw(&mut rng);
                let result = pipeline.project_with(&sequence)?;

                completed.fetch_add(1, Ordering::Relaxed);
                Ok(TrialOutcome::from_projection(trial_index, &result, criterion))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((trials, seed))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Run a Monte Carlo batch for `plan` with `config`
pub fn simulate(plan: &RetirementPlan, config: SimulationConfig) -> Result<SimulationRun> {
    MonteCarloEngine::new(config).simulate(plan)
}
