//! Reduces a batch of trial outcomes to summary statistics
//!
//! Percentiles interpolate linearly between closest ranks, so the p-th
//! percentile of `n` sorted values sits at rank `p / 100 * (n - 1)`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::monte_carlo::{SimulationConfig, TrialOutcome, DEFAULT_HISTOGRAM_BINS, DEFAULT_PERCENTILES};

/// One percentile's value for every year of the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileTrajectory {
    pub percentile: f64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: f64,
}

/// Distribution of final portfolio values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Vec<PercentileValue>,
}

/// Equal-width bucket of final values; the last bin includes its upper edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
}

/// Everything a presentation layer needs from a simulation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub trial_count: u32,
    pub success_count: u32,
    /// Share of successful trials, in [0, 1]
    pub success_probability: f64,
    /// Share of trials whose portfolio ran out at some point
    pub depletion_rate: f64,
    /// Median depletion age among trials that depleted
    pub median_depletion_age: Option<f64>,
    /// Age during each projected year
    pub ages: Vec<u32>,
    pub percentile_trajectories: Vec<PercentileTrajectory>,
    pub terminal: TerminalStats,
    pub histogram: Vec<HistogramBin>,
    /// Base seed that reproduces the batch
    pub seed: Option<u64>,
}

impl SimulationSummary {
    /// Per-year values of one reported percentile
    pub fn trajectory(&self, percentile: f64) -> Option<&[f64]> {
        self.percentile_trajectories
            .iter()
            .find(|t| t.percentile == percentile)
            .map(|t| t.values.as_slice())
    }
}

/// Value at percentile `p` (0-100) of an ascending slice
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsAggregator {
    percentiles: Vec<f64>,
    histogram_bins: usize,
}

impl StatisticsAggregator {
    pub fn new(percentiles: Vec<f64>, histogram_bins: usize) -> Self {
        Self {
            percentiles,
            histogram_bins: histogram_bins.max(1),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.percentiles.clone(), config.histogram_bins)
    }

    pub fn summarize(&self, trials: &[TrialOutcome]) -> Result<SimulationSummary> {
        if trials.is_empty() {
            return Err(PlanError::EmptyTrialSet);
        }
        let n = trials.len() as f64;

        let success_count = trials.iter().filter(|t| t.success).count() as u32;
        let depletion_ages = sorted(trials.iter().filter_map(|t| t.depletion_age).map(f64::from).collect());
        let depletion_rate = depletion_ages.len() as f64 / n;

        let years = trials.iter().map(|t| t.trajectory.len()).min().unwrap_or(0);
        let start_age = trials[0].start_age;

        Ok(SimulationSummary {
            trial_count: trials.len() as u32,
            success_count,
            success_probability: success_count as f64 / n,
            depletion_rate,
            median_depletion_age: percentile(&depletion_ages, 50.0),
            ages: (0..years as u32).map(|i| start_age + i).collect(),
            percentile_trajectories: self.percentile_trajectories(trials, years),
            terminal: self.terminal_stats(trials),
            histogram: self.histogram(trials),
            seed: None,
        })
    }

    fn percentile_trajectories(&self, trials: &[TrialOutcome], years: usize) -> Vec<PercentileTrajectory> {
        // Each year's cross-trial distribution is sorted once and shared by every percentile
        let columns: Vec<Vec<f64>> = (0..years)
            .into_par_iter()
            .map(|year| sorted(trials.iter().map(|t| t.trajectory[year]).collect()))
            .collect();

        self.percentiles
            .iter()
            .map(|&p| PercentileTrajectory {
                percentile: p,
                values: columns.iter().filter_map(|col| percentile(col, p)).collect(),
            })
            .collect()
    }

    fn terminal_stats(&self, trials: &[TrialOutcome]) -> TerminalStats {
        let values = sorted(trials.iter().map(TrialOutcome::final_value).collect());
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        TerminalStats {
            mean,
            median: percentile(&values, 50.0).unwrap_or(0.0),
            std_dev: variance.sqrt(),
            min: values.first().copied().unwrap_or(0.0),
            max: values.last().copied().unwrap_or(0.0),
            percentiles: self
                .percentiles
                .iter()
                .filter_map(|&p| percentile(&values, p).map(|value| PercentileValue { percentile: p, value }))
                .collect(),
        }
    }

    fn histogram(&self, trials: &[TrialOutcome]) -> Vec<HistogramBin> {
        let values: Vec<f64> = trials.iter().map(TrialOutcome::final_value).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max <= min {
            return vec![HistogramBin {
                lower: min,
                upper: max,
                count: values.len() as u32,
            }];
        }

        let bins = self.histogram_bins;
        let width = (max - min) / bins as f64;
        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                lower: min + width * i as f64,
                upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
                count: 0,
            })
            .collect();

        for v in values {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            histogram[idx].count += 1;
        }
        histogram
    }
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_PERCENTILES.to_vec(), DEFAULT_HISTOGRAM_BINS)
    }
}
