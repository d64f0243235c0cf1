//! Finding records and the JSON artifacts that carry them between phases

pub mod artifact;
mod types;

pub use artifact::{
    load_or_default, read_json, write_json, ArtifactError, DetectorReport, LogicReport,
    StaticReport,
};
pub use types::{
    CandidateFinding, Confidence, Finding, GateDecision, Gated, Impact, LineLocation,
    LogicFinding, VerifiedFinding, GLOBAL_LOGIC_LINE, NO_CITATION,
};
