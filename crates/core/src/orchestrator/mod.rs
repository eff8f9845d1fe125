//! GTFS pipeline orchestrator.
//!
//! Each run walks a small state machine:
//! - **RunFetch**: invoke the fetch task
//! - **Decide**: branch on the fetch status (`updated` → transform, `unchanged` → done)
//! - **RunTransform**: invoke the transform task with the fetched raw artifact
//! - **NotifyFailure**: publish one failure notification, then end the run
//!
//! Only one run is in progress at a time; overlapping triggers are rejected.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::PipelineOrchestrator;
pub use types::{
    OrchestratorError, OrchestratorStatus, RunOutcome, RunReport, RunState, StateKind, TaskStage,
};
