//! Verbatim-evidence gate
//!
//! The single quality checkpoint between analysis and remediation. Each finding's
//! citation is located in the audited source with [`crate::evidence::locate`]:
//!
//! - static findings (analyzer + oracle triage) without a located citation are dropped
//!   as unsupported claims;
//! - logic findings (deep audit) without a located citation are kept for manual review,
//!   since cross-function reasoning often has no single verbatim line.
//!
//! A located citation yields `Confident` with the computed line in both cases.

use crate::evidence::locate;
use crate::findings::{
    read_json, write_json, ArtifactError, Confidence, Finding, GateDecision, Gated,
    LineLocation, LogicFinding, LogicReport, StaticReport, VerifiedFinding,
};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CONFIRMED_NOTE: &str = "Code match confirmed.";
pub const MANUAL_REVIEW_NOTE: &str =
    "Logic finding: Verbatim code snippet match failed. Verify logic manually.";

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Failed to persist gated {kind} findings: {source}")]
    Persist {
        kind: FindingKind,
        #[source]
        source: ArtifactError,
    },
}

/// Which policy applies to a finding collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Static,
    Logic,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::Static => f.write_str("static"),
            FindingKind::Logic => f.write_str("logic"),
        }
    }
}

/// Counts for one gated collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateStats {
    pub kind: FindingKind,
    pub input: usize,
    pub dropped: usize,
    pub confident: usize,
    pub manual_review: usize,
}

impl GateStats {
    pub fn empty(kind: FindingKind) -> Self {
        Self {
            kind,
            input: 0,
            dropped: 0,
            confident: 0,
            manual_review: 0,
        }
    }

    pub fn kept(&self) -> usize {
        self.confident + self.manual_review
    }
}

pub struct Gatekeeper<'a> {
    source: &'a str,
}

impl<'a> Gatekeeper<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Decision for one citation; `None` means the finding is rejected
    pub fn decide(&self, citation: Option<&str>, kind: FindingKind) -> Option<GateDecision> {
        match citation.and_then(|snippet| locate(snippet, self.source)) {
            Some(found) => Some(GateDecision {
                confidence: Confidence::Confident,
                line_number: LineLocation::Line(found.line_in(self.source)),
                gatekeeper_note: CONFIRMED_NOTE.to_string(),
            }),
            None => match kind {
                FindingKind::Static => None,
                FindingKind::Logic => Some(GateDecision {
                    confidence: Confidence::ManualReview,
                    line_number: LineLocation::Global,
                    gatekeeper_note: MANUAL_REVIEW_NOTE.to_string(),
                }),
            },
        }
    }

    /// Applies the policy for `kind` to every finding, preserving order
    pub fn gate<F: Finding>(&self, findings: Vec<F>, kind: FindingKind) -> (Vec<Gated<F>>, GateStats) {
        let mut stats = GateStats::empty(kind);
        stats.input = findings.len();

        let mut gated = Vec::with_capacity(findings.len());
        for finding in findings {
            match self.decide(finding.citation(), kind) {
                Some(decision) => {
                    match decision.confidence {
                        Confidence::Confident => stats.confident += 1,
                        Confidence::ManualReview => stats.manual_review += 1,
                    }
                    gated.push(Gated { finding, decision });
                }
                None => {
                    warn!(
                        "Rejected unsupported {} finding: {}",
                        kind,
                        finding.label().chars().take(30).collect::<String>()
                    );
                    stats.dropped += 1;
                }
            }
        }

        (gated, stats)
    }

    /// Gates the static-verification artifact in place
    pub fn validate_static_report(&self, path: &Path) -> Result<GateStats, GateError> {
        let kind = FindingKind::Static;
        let Some(report) = Self::load::<StaticReport<VerifiedFinding>>(path, kind) else {
            return Ok(GateStats::empty(kind));
        };

        let (gated, stats) = self.gate(report.verified_vulnerabilities, kind);
        let gated_report = StaticReport {
            contract: report.contract,
            verified_vulnerabilities: gated,
        };

        write_json(path, &gated_report).map_err(|source| GateError::Persist { kind, source })?;
        Self::log_stats(&stats);
        Ok(stats)
    }

    /// Gates the logic-verification artifact in place
    pub fn validate_logic_report(&self, path: &Path) -> Result<GateStats, GateError> {
        let kind = FindingKind::Logic;
        let Some(report) = Self::load::<LogicReport<LogicFinding>>(path, kind) else {
            return Ok(GateStats::empty(kind));
        };

        let (gated, stats) = self.gate(report.logic_vulnerabilities, kind);
        let gated_report = LogicReport {
            logic_vulnerabilities: gated,
        };

        write_json(path, &gated_report).map_err(|source| GateError::Persist { kind, source })?;
        Self::log_stats(&stats);
        Ok(stats)
    }

    fn load<T: serde::de::DeserializeOwned>(path: &Path, kind: FindingKind) -> Option<T> {
        if !path.exists() {
            debug!("No {} artifact at {}, nothing to gate", kind, path.display());
            return None;
        }

        info!("Gatekeeper: validating {} findings", kind);
        match read_json(path) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping {} gate: {}", kind, e);
                None
            }
        }
    }

    fn log_stats(stats: &GateStats) {
        info!(
            kind = %stats.kind,
            input = stats.input,
            confident = stats.confident,
            manual_review = stats.manual_review,
            dropped = stats.dropped,
            "Gate complete"
        );
    }
}
