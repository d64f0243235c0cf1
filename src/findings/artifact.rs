//! On-disk JSON artifacts passed between phases
//!
//! Every phase fully overwrites its artifact. Readers of advisory artifacts use
//! [`load_or_default`], which turns a missing or malformed file into an empty value.

use super::types::CandidateFinding;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed artifact {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Analyzer findings as written by the Detect phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorReport {
    pub contract: String,
    #[serde(default)]
    pub issues: Vec<CandidateFinding>,
}

/// Static-verification artifact, before (`F = VerifiedFinding`) or after
/// (`F = Gated<VerifiedFinding>`) the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticReport<F> {
    #[serde(default)]
    pub contract: String,
    #[serde(default = "Vec::new")]
    pub verified_vulnerabilities: Vec<F>,
}

impl<F> Default for StaticReport<F> {
    fn default() -> Self {
        Self {
            contract: String::new(),
            verified_vulnerabilities: Vec::new(),
        }
    }
}

/// Logic-verification artifact, before or after the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicReport<F> {
    #[serde(default = "Vec::new")]
    pub logic_vulnerabilities: Vec<F>,
}

impl<F> Default for LogicReport<F> {
    fn default() -> Self {
        Self {
            logic_vulnerabilities: Vec::new(),
        }
    }
}

/// Writes `value` as pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let body = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, body).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote artifact {}", path.display());
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ArtifactError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an advisory artifact; absence or corruption yields `T::default()`
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            debug!("{}; using empty defaults", e);
            T::default()
        }
    }
}
