//! Load plans and simulation settings from JSON

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RetirementPlan;
use crate::error::PlanError;
use crate::monte_carlo::SimulationConfig;

/// On-disk plan document: the plan plus optional Monte Carlo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    pub plan: RetirementPlan,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read plan file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed plan document")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] PlanError),
}

/// Parse and validate a plan document
pub fn parse_plan(json: &str) -> Result<PlanFile, LoadError> {
    let file: PlanFile = serde_json::from_str(json)?;
    file.plan.phase_durations()?;
    file.simulation.validate()?;
    Ok(file)
}

/// Read, parse and validate a plan document from disk
pub fn load_plan_file<P: AsRef<Path>>(path: P) -> Result<PlanFile, LoadError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file = parse_plan(&json)?;
    log::info!("Loaded plan from {}", path.display());
    Ok(file)
}
