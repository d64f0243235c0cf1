//! Finding records exchanged between pipeline phases
//!
//! Sentinel strings used by the on-disk artifacts (`"N/A"` for a missing citation,
//! `"Global/Logic"` for an unlocated finding, `"Manual Review"` for the review
//! confidence) exist only at the serialization boundary. In memory they are
//! `Option`s and enum variants.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Citation sentinel meaning "no evidence quoted"
pub const NO_CITATION: &str = "N/A";

/// Line sentinel for findings without a verbatim location
pub const GLOBAL_LOGIC_LINE: &str = "Global/Logic";

/// A single raw observation from the static analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFinding {
    /// Detector / rule identifier, e.g. `reentrancy-eth`
    #[serde(rename = "check")]
    pub check_kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "impact", default, skip_serializing_if = "Option::is_none")]
    pub severity_hint: Option<String>,
    #[serde(rename = "confidence", default, skip_serializing_if = "Option::is_none")]
    pub tool_confidence_hint: Option<String>,
}

impl CandidateFinding {
    pub fn new(check_kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            check_kind: check_kind.into(),
            description: description.into(),
            severity_hint: None,
            tool_confidence_hint: None,
        }
    }
}

/// Severity assigned by triage
///
/// Unknown strings coming back from the oracle are preserved verbatim in
/// [`Impact::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Impact {
    Critical,
    High,
    Medium,
    Low,
    Informational,
    /// Placeholder impact for findings whose verification failed
    Error,
    Other(String),
}

impl Impact {
    pub fn as_str(&self) -> &str {
        match self {
            Impact::Critical => "Critical",
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
            Impact::Informational => "Informational",
            Impact::Error => "Error",
            Impact::Other(raw) => raw,
        }
    }

    /// Critical or High
    pub fn is_severe(&self) -> bool {
        matches!(self, Impact::Critical | Impact::High)
    }
}

impl Default for Impact {
    fn default() -> Self {
        Impact::Other("Unknown".to_string())
    }
}

impl From<String> for Impact {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Impact::Critical,
            "high" => Impact::High,
            "medium" => Impact::Medium,
            "low" => Impact::Low,
            "informational" | "info" => Impact::Informational,
            "error" => Impact::Error,
            _ => Impact::Other(raw),
        }
    }
}

impl From<Impact> for String {
    fn from(impact: Impact) -> Self {
        impact.as_str().to_string()
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage result for one [`CandidateFinding`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedFinding {
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_check: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_vulnerability: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub true_impact: Impact,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default, with = "citation")]
    pub code_citation: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remediation: String,
}

impl VerifiedFinding {
    /// Placeholder emitted when the oracle call for a finding's batch failed
    pub fn verification_failed(original_check: impl Into<String>) -> Self {
        Self {
            original_check: original_check.into(),
            is_vulnerability: false,
            true_impact: Impact::Error,
            explanation: "Batch verification failed.".to_string(),
            code_citation: None,
            remediation: "Manual review.".to_string(),
        }
    }
}

/// Finding produced by whole-artifact deep reasoning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicFinding {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub true_impact: Impact,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default, with = "citation")]
    pub code_citation: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remediation: String,
}

/// Common view over gateable findings
pub trait Finding {
    /// Short label used in logs and reports
    fn label(&self) -> &str;
    fn impact(&self) -> &Impact;
    fn citation(&self) -> Option<&str>;
    fn explanation(&self) -> &str;
    fn remediation(&self) -> &str;
}

impl Finding for VerifiedFinding {
    fn label(&self) -> &str {
        &self.original_check
    }

    fn impact(&self) -> &Impact {
        &self.true_impact
    }

    fn citation(&self) -> Option<&str> {
        self.code_citation.as_deref()
    }

    fn explanation(&self) -> &str {
        &self.explanation
    }

    fn remediation(&self) -> &str {
        &self.remediation
    }
}

impl Finding for LogicFinding {
    fn label(&self) -> &str {
        &self.title
    }

    fn impact(&self) -> &Impact {
        &self.true_impact
    }

    fn citation(&self) -> Option<&str> {
        self.code_citation.as_deref()
    }

    fn explanation(&self) -> &str {
        &self.explanation
    }

    fn remediation(&self) -> &str {
        &self.remediation
    }
}

/// Post-gate confidence classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Confident,
    #[serde(rename = "Manual Review", alias = "ManualReview")]
    ManualReview,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Confident => f.write_str("Confident"),
            Confidence::ManualReview => f.write_str("Manual Review"),
        }
    }
}

/// Where a finding's evidence lives in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLocation {
    /// 1-based line of the first matched character
    Line(usize),
    /// No verbatim location; the finding spans logic rather than a line
    Global,
}

impl Serialize for LineLocation {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            LineLocation::Line(n) => s.serialize_u64(*n as u64),
            LineLocation::Global => s.serialize_str(GLOBAL_LOGIC_LINE),
        }
    }
}

impl<'de> Deserialize<'de> for LineLocation {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(usize),
            Text(String),
        }

        match Repr::deserialize(d)? {
            Repr::Number(0) => Err(D::Error::custom("line numbers are 1-based")),
            Repr::Number(n) => Ok(LineLocation::Line(n)),
            Repr::Text(s) if s == GLOBAL_LOGIC_LINE => Ok(LineLocation::Global),
            Repr::Text(s) => s
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(LineLocation::Line)
                .ok_or_else(|| D::Error::custom(format!("invalid line number: {}", s))),
        }
    }
}

impl fmt::Display for LineLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineLocation::Line(n) => write!(f, "{}", n),
            LineLocation::Global => f.write_str(GLOBAL_LOGIC_LINE),
        }
    }
}

/// The augmentation a finding receives from the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub confidence: Confidence,
    pub line_number: LineLocation,
    #[serde(default)]
    pub gatekeeper_note: String,
}

/// A finding together with its gate decision
///
/// Serialized flat, so the artifact keeps the finding's own keys plus
/// `confidence`, `line_number` and `gatekeeper_note`. Records without a
/// decision fail to deserialize as `Gated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gated<F> {
    #[serde(flatten)]
    pub finding: F,
    #[serde(flatten)]
    pub decision: GateDecision,
}

impl<F> Gated<F> {
    pub fn is_confident(&self) -> bool {
        self.decision.confidence == Confidence::Confident
    }
}

/// Oracles emit `null` for fields they have nothing to say about
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// `Option<String>` <-> `"N/A"` sentinel
mod citation {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(NO_CITATION))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.filter(|s| {
            let trimmed = s.trim();
            !trimmed.is_empty() && trimmed != NO_CITATION
        }))
    }
}
