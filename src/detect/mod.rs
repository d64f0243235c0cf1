//! Detect phase: the external static analyzer
//!
//! The analyzer is an opaque collaborator that turns a contract into a list of
//! [`CandidateFinding`]s. Any failure to obtain a parseable findings document is
//! fatal for the whole audit run.

mod pragma;
mod slither;

pub use pragma::{pragma_version, select_solc};
pub use slither::{parse_slither_output, ReportFileAnalyzer, SlitherAnalyzer};

use crate::findings::{ArtifactError, CandidateFinding};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Contract not found: {0}")]
    ContractNotFound(PathBuf),

    #[error("Failed to read contract {path}: {source}")]
    ContractUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch analyzer '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Analyzer failed (exit code {status:?}): {detail}")]
    AnalyzerFailed { status: Option<i32>, detail: String },

    #[error("Analyzer produced no parseable findings document")]
    NoParseableOutput,

    #[error("Failed to clear stale artifacts under {root}: {source}")]
    StaleArtifacts {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    ArtifactWrite(#[from] ArtifactError),
}

/// Produces raw findings for one contract
#[async_trait]
pub trait StaticAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(
        &self,
        contract: &Path,
        source: &str,
    ) -> Result<Vec<CandidateFinding>, DetectError>;
}
