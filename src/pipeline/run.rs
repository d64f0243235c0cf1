//! Run state and phase outcomes
//!
//! [`PipelineRun`] is an immutable snapshot. Every transition returns a new snapshot,
//! and phases only move forward: re-entering or going back is a [`PhaseTransitionError`].

use crate::gate::GateStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Detect,
    Analysis,
    Gate,
    Remediation,
    Report,
    Done,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Detect => "Detect",
            Phase::Analysis => "Analysis",
            Phase::Gate => "Gate",
            Phase::Remediation => "Remediation",
            Phase::Report => "Report",
            Phase::Done => "Done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal phase transition: {from} -> {to}")]
pub struct PhaseTransitionError {
    pub from: Phase,
    pub to: Phase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub artifact_path: PathBuf,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    /// Hex SHA-256 of the audited source
    pub source_digest: String,
}

impl PipelineRun {
    pub fn start(artifact_path: impl Into<PathBuf>, source: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            artifact_path: artifact_path.into(),
            phase: Phase::Detect,
            started_at: Utc::now(),
            source_digest: source_digest(source),
        }
    }

    /// New snapshot at `next`; `next` must be strictly later than the current phase
    pub fn advance(&self, next: Phase) -> Result<PipelineRun, PhaseTransitionError> {
        if next <= self.phase {
            return Err(PhaseTransitionError {
                from: self.phase,
                to: next,
            });
        }

        Ok(PipelineRun {
            phase: next,
            ..self.clone()
        })
    }

    /// File name of the audited contract, or the full path when it has none
    pub fn contract_name(&self) -> String {
        contract_name(&self.artifact_path)
    }
}

pub fn contract_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn source_digest(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

/// Result of one sub-task within a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Succeeded { detail: String },
    /// Finished, but with partial results recorded as data
    Degraded { detail: String },
    Skipped { reason: String },
    Failed { error: String },
}

impl TaskOutcome {
    pub fn succeeded(detail: impl Into<String>) -> Self {
        TaskOutcome::Succeeded {
            detail: detail.into(),
        }
    }

    pub fn degraded(detail: impl Into<String>) -> Self {
        TaskOutcome::Degraded {
            detail: detail.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        TaskOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        TaskOutcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskOutcome::Failed { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            TaskOutcome::Succeeded { .. } => "succeeded",
            TaskOutcome::Degraded { .. } => "degraded",
            TaskOutcome::Skipped { .. } => "skipped",
            TaskOutcome::Failed { .. } => "failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TaskOutcome::Succeeded { detail } | TaskOutcome::Degraded { detail } => detail,
            TaskOutcome::Skipped { reason } => reason,
            TaskOutcome::Failed { error } => error,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status(), self.message())
    }
}

/// What one phase produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseOutcome {
    Detect {
        outcome: TaskOutcome,
        findings: usize,
    },
    Analysis {
        verify: TaskOutcome,
        deep_audit: TaskOutcome,
    },
    Gate {
        static_gate: TaskOutcome,
        logic_gate: TaskOutcome,
        stats: Vec<GateStats>,
    },
    Remediation {
        refactor: TaskOutcome,
        exploit: TaskOutcome,
    },
    Report {
        report: TaskOutcome,
    },
}

impl PhaseOutcome {
    pub fn phase(&self) -> Phase {
        match self {
            PhaseOutcome::Detect { .. } => Phase::Detect,
            PhaseOutcome::Analysis { .. } => Phase::Analysis,
            PhaseOutcome::Gate { .. } => Phase::Gate,
            PhaseOutcome::Remediation { .. } => Phase::Remediation,
            PhaseOutcome::Report { .. } => Phase::Report,
        }
    }

    /// Named sub-task outcomes, in display order
    pub fn tasks(&self) -> Vec<(&'static str, &TaskOutcome)> {
        match self {
            PhaseOutcome::Detect { outcome, .. } => vec![("detect", outcome)],
            PhaseOutcome::Analysis { verify, deep_audit } => {
                vec![("verify", verify), ("deep_audit", deep_audit)]
            }
            PhaseOutcome::Gate {
                static_gate,
                logic_gate,
                ..
            } => vec![("static_gate", static_gate), ("logic_gate", logic_gate)],
            PhaseOutcome::Remediation { refactor, exploit } => {
                vec![("refactor", refactor), ("exploit", exploit)]
            }
            PhaseOutcome::Report { report } => vec![("report", report)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Aborted { error: String },
}

/// Everything a finished (or aborted) run reports
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run: PipelineRun,
    pub outcome: RunOutcome,
    pub phases: Vec<PhaseOutcome>,
    pub artifacts: Vec<PathBuf>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|p| p.phase() == phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_starts_at_detect() {
        let run = PipelineRun::start("contracts/Bank.sol", "contract Bank {}");
        assert_eq!(run.phase, Phase::Detect);
        assert_eq!(run.contract_name(), "Bank.sol");
        assert_eq!(run.source_digest.len(), 64);
    }

    #[test]
    fn test_advance_returns_new_snapshot() {
        let run = PipelineRun::start("Bank.sol", "");
        let next = run.advance(Phase::Analysis).unwrap();

        assert_eq!(run.phase, Phase::Detect);
        assert_eq!(next.phase, Phase::Analysis);
        assert_eq!(next.id, run.id);
        assert_eq!(next.started_at, run.started_at);
    }

    #[test]
    fn test_advance_may_skip_forward() {
        let run = PipelineRun::start("Bank.sol", "");
        assert_eq!(run.advance(Phase::Done).unwrap().phase, Phase::Done);
    }

    #[test]
    fn test_no_reentry_or_backwards() {
        let run = PipelineRun::start("Bank.sol", "")
            .advance(Phase::Gate)
            .unwrap();

        assert_eq!(
            run.advance(Phase::Gate),
            Err(PhaseTransitionError {
                from: Phase::Gate,
                to: Phase::Gate
            })
        );
        assert!(run.advance(Phase::Analysis).is_err());
    }

    #[test]
    fn test_source_digest_is_sha256() {
        assert_eq!(
            source_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_phase_outcome_serializes_tagged() {
        let outcome = PhaseOutcome::Remediation {
            refactor: TaskOutcome::succeeded("wrote Fixed_Bank.sol"),
            exploit: TaskOutcome::failed("oracle down"),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["phase"], "remediation");
        assert_eq!(value["refactor"]["status"], "succeeded");
        assert_eq!(value["exploit"]["error"], "oracle down");
        assert_eq!(outcome.phase(), Phase::Remediation);
    }
}
