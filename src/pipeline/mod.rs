//! Audit pipeline: run state, artifact layout, downstream task seam and the orchestrator

pub mod context;
pub mod orchestrator;
pub mod paths;
pub mod run;
pub mod task;

pub use context::PipelineContext;
pub use orchestrator::AuditPipeline;
pub use paths::ArtifactPaths;
pub use run::{
    contract_name, source_digest, Phase, PhaseOutcome, PhaseTransitionError, PipelineRun,
    RunOutcome, RunSummary, TaskOutcome,
};
pub use task::{StageInput, StageTask};
