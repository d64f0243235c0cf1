//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use crate::pipeline::TaskOutcome;
use tracing::{error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { contract } => {
                info!(contract = %contract.display(), "Starting audit");
            }
            ProgressEvent::PhaseStarted { phase } => {
                info!(phase = %phase, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::TaskFinished {
                phase,
                task,
                outcome,
            } => match outcome {
                TaskOutcome::Failed { error } => {
                    warn!(phase = %phase, task = %task, error = %error, "Task failed");
                }
                TaskOutcome::Degraded { detail } => {
                    warn!(phase = %phase, task = %task, detail = %detail, "Task degraded");
                }
                other => {
                    info!(phase = %phase, task = %task, status = other.status(), "{}", other.message());
                }
            },
            ProgressEvent::Completed { total_time } => {
                info!(total_time_ms = total_time.as_millis(), "Audit complete");
            }
            ProgressEvent::Aborted { error } => {
                error!(error = %error, "Audit aborted");
            }
        }
    }
}
