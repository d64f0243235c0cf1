//! Artifact layout of one run's output directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DETECTOR_REPORT: &str = "agent_processed_output.json";
pub const STATIC_REPORT: &str = "verified_slither_report.json";
pub const LOGIC_REPORT: &str = "human_audit_report.json";
pub const FINAL_REPORT: &str = "FINAL_AUDIT_REPORT.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    pub fn detector_report(&self) -> PathBuf {
        self.outputs_dir().join(DETECTOR_REPORT)
    }

    pub fn static_report(&self) -> PathBuf {
        self.outputs_dir().join(STATIC_REPORT)
    }

    pub fn logic_report(&self) -> PathBuf {
        self.outputs_dir().join(LOGIC_REPORT)
    }

    pub fn fixed_contracts_dir(&self) -> PathBuf {
        self.root.join("fixed_contracts")
    }

    pub fn red_team_dir(&self) -> PathBuf {
        self.root.join("red_team_manuals")
    }

    pub fn final_report(&self) -> PathBuf {
        self.root.join(FINAL_REPORT)
    }

    /// Removes everything a previous run left behind: `*.json` in `outputs/`, the final
    /// report, and the fixed-contract and exploit-manual directories
    pub fn clear_stale(&self) -> io::Result<usize> {
        let mut removed = 0;

        match fs::read_dir(self.outputs_dir()) {
            Ok(entries) => {
                for entry in entries {
                    let path = entry?.path();
                    if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                        fs::remove_file(&path)?;
                        debug!("Removed stale artifact {}", path.display());
                        removed += 1;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let report = self.final_report();
        if report.is_file() {
            fs::remove_file(&report)?;
            debug!("Removed stale artifact {}", report.display());
            removed += 1;
        }

        for dir in [self.fixed_contracts_dir(), self.red_team_dir()] {
            if dir.is_dir() {
                fs::remove_dir_all(&dir)?;
                debug!("Removed stale artifact directory {}", dir.display());
                removed += 1;
            }
        }

        Ok(removed)
    }
}
