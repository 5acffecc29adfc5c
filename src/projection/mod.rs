//! Deterministic projection of a plan through all four phases

mod sequence;
mod result;
mod pipeline;

pub use sequence::ReturnSequence;
pub use result::{ProjectionResult, ProjectionSummary};
pub use pipeline::{project_plan, ProjectionPipeline};
