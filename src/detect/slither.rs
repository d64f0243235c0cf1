use super::pragma::{pragma_version, select_solc};
use super::{DetectError, StaticAnalyzer};
use crate::findings::CandidateFinding;
use crate::llm::extract_json_object;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SlitherOutput {
    results: Option<SlitherResults>,
}

#[derive(Debug, Default, Deserialize)]
struct SlitherResults {
    #[serde(default)]
    detectors: Vec<SlitherDetector>,
}

#[derive(Debug, Deserialize)]
struct SlitherDetector {
    check: String,
    #[serde(default)]
    description: String,
    impact: Option<String>,
    confidence: Option<String>,
}

/// Parses a Slither `--json` document, tolerating text around it
///
/// Returns `None` when no JSON object with a `results` section can be found.
pub fn parse_slither_output(raw: &str) -> Option<Vec<CandidateFinding>> {
    let json = extract_json_object(raw)?;
    let output: SlitherOutput = serde_json::from_str(json).ok()?;
    let results = output.results?;

    Some(
        results
            .detectors
            .into_iter()
            .map(|d| CandidateFinding {
                check_kind: d.check,
                description: d.description.trim().to_string(),
                severity_hint: d.impact,
                tool_confidence_hint: d.confidence,
            })
            .collect(),
    )
}

/// Runs Slither as an external process
#[derive(Debug, Clone)]
pub struct SlitherAnalyzer {
    command: String,
    solc_select: bool,
}

impl SlitherAnalyzer {
    pub fn new(command: impl Into<String>, solc_select: bool) -> Self {
        Self {
            command: command.into(),
            solc_select,
        }
    }
}

impl Default for SlitherAnalyzer {
    fn default() -> Self {
        Self::new("slither", true)
    }
}

#[async_trait]
impl StaticAnalyzer for SlitherAnalyzer {
    fn name(&self) -> &str {
        "slither"
    }

    async fn analyze(&self, contract: &Path, source: &str) -> Result<Vec<CandidateFinding>, DetectError> {
        if self.solc_select {
            match pragma_version(source) {
                Some(version) => select_solc(&version).await,
                None => info!("No pragma version found, using system default solc"),
            }
        }

        info!("Running command: {} {} --json -", self.command, contract.display());

        let output = Command::new(&self.command)
            .arg(contract)
            .args(["--json", "-"])
            .env("NO_COLOR", "1")
            .output()
            .await
            .map_err(|source| DetectError::SpawnFailed {
                command: self.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            debug!(
                "{} exited with {} (findings likely detected)",
                self.command, output.status
            );
            return parse_slither_output(&stdout).ok_or_else(|| {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = if stderr.trim().is_empty() {
                    stdout.trim().to_string()
                } else {
                    stderr.trim().to_string()
                };
                DetectError::AnalyzerFailed {
                    status: output.status.code(),
                    detail: if detail.is_empty() {
                        "Unknown error".to_string()
                    } else {
                        detail
                    },
                }
            });
        }

        parse_slither_output(&stdout).ok_or(DetectError::NoParseableOutput)
    }
}

/// Replays a previously captured Slither JSON report instead of running the tool
#[derive(Debug, Clone)]
pub struct ReportFileAnalyzer {
    path: PathBuf,
}

impl ReportFileAnalyzer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StaticAnalyzer for ReportFileAnalyzer {
    fn name(&self) -> &str {
        "slither-report"
    }

    async fn analyze(&self, _contract: &Path, _source: &str) -> Result<Vec<CandidateFinding>, DetectError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DetectError::AnalyzerFailed {
                status: None,
                detail: format!("cannot read {}: {}", self.path.display(), source),
            })?;

        parse_slither_output(&raw).ok_or(DetectError::NoParseableOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SLITHER_JSON: &str = r#"{
        "success": true,
        "error": null,
        "results": {
            "detectors": [
                {
                    "check": "reentrancy-eth",
                    "description": "Reentrancy in Bank.withdraw() (Bank.sol#10-15):\n",
                    "impact": "High",
                    "confidence": "Medium"
                },
                {
                    "check": "solc-version",
                    "description": "Pragma version^0.4.24 allows old versions\n",
                    "impact": "Informational",
                    "confidence": "High"
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_detectors() {
        let findings = parse_slither_output(SLITHER_JSON).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].check_kind, "reentrancy-eth");
        assert_eq!(findings[0].description, "Reentrancy in Bank.withdraw() (Bank.sol#10-15):");
        assert_eq!(findings[0].severity_hint.as_deref(), Some("High"));
        assert_eq!(findings[1].tool_confidence_hint.as_deref(), Some("High"));
    }

    #[test]
    fn test_parse_with_log_noise() {
        let raw = format!("INFO:Detectors:\n{}\nINFO:Slither:analyzed 1 contract", SLITHER_JSON);
        assert_eq!(parse_slither_output(&raw).unwrap().len(), 2);
    }

    #[test]
    fn test_results_without_detectors_is_empty() {
        let findings = parse_slither_output(r#"{"success": true, "results": {}}"#).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_missing_results_is_unparseable() {
        assert!(parse_slither_output(r#"{"success": false, "error": "solc not found"}"#).is_none());
        assert!(parse_slither_output("Traceback (most recent call last):").is_none());
    }

    #[tokio::test]
    async fn test_report_file_analyzer() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SLITHER_JSON.as_bytes()).unwrap();

        let analyzer = ReportFileAnalyzer::new(file.path());
        let findings = analyzer.analyze(Path::new("Bank.sol"), "").await.unwrap();
        assert_eq!(findings.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let analyzer = SlitherAnalyzer::new("smartaudit-no-such-analyzer", false);
        let result = analyzer.analyze(Path::new("Bank.sol"), "").await;
        assert!(matches!(result, Err(DetectError::SpawnFailed { .. })));
    }
}
