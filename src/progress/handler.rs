//! Progress handler trait and events

use crate::pipeline::{Phase, TaskOutcome};
use std::path::PathBuf;
use std::time::Duration;

/// Events emitted while an audit run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { contract: PathBuf },

    PhaseStarted { phase: Phase },

    PhaseComplete { phase: Phase, duration: Duration },

    /// A sub-task within a phase finished, successfully or not
    TaskFinished {
        phase: Phase,
        task: String,
        outcome: TaskOutcome,
    },

    /// Run reached Done
    Completed { total_time: Duration },

    /// Detect failed and the run stopped
    Aborted { error: String },
}

/// Receives progress events from the pipeline
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
