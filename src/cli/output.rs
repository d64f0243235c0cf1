//! Output formatting for multiple formats
//!
//! Renders a [`RunSummary`] or a gate-only run as JSON, YAML, or human-readable text.
//!
//! # Example
//!
//! ```ignore
//! use smartaudit::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_summary(&summary)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::gate::GateStats;
use crate::pipeline::{PhaseOutcome, RunOutcome, RunSummary, TaskOutcome};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Result of a standalone `gate` invocation
#[derive(Debug, Clone, Serialize)]
pub struct GateSummary {
    pub contract: PathBuf,
    pub stats: Vec<GateStats>,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_summary(&self, summary: &RunSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .context("Failed to serialize run summary to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(summary).context("Failed to serialize run summary to YAML")
            }
            OutputFormat::Human => Ok(self.format_summary_human(summary)),
        }
    }

    pub fn format_gate(&self, summary: &GateSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .context("Failed to serialize gate summary to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(summary).context("Failed to serialize gate summary to YAML")
            }
            OutputFormat::Human => Ok(self.format_gate_human(summary)),
        }
    }

    fn format_summary_human(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        match &summary.outcome {
            RunOutcome::Completed => output.push_str("\u{2713} Audit Complete\n"),
            RunOutcome::Aborted { .. } => output.push_str("\u{2717} Audit Aborted\n"),
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Contract:  {}\n", summary.run.artifact_path.display()));
        output.push_str(&format!("Run:       {}\n", summary.run.id));
        output.push_str(&format!("Duration:  {:.1}s\n\n", summary.duration_ms as f64 / 1000.0));

        if let RunOutcome::Aborted { error } = &summary.outcome {
            output.push_str(&format!("Error: {}\n\n", error));
        }

        if !summary.phases.is_empty() {
            output.push_str("Phases:\n");
            for phase in &summary.phases {
                output.push_str(&format!("\u{251C}\u{2500} {}\n", phase.phase()));
                let tasks = phase.tasks();
                for (i, (name, outcome)) in tasks.iter().enumerate() {
                    let connector = if i == tasks.len() - 1 { "\u{2514}" } else { "\u{251C}" };
                    output.push_str(&format!(
                        "\u{2502}  {}\u{2500} {} {:<11} {}\n",
                        connector,
                        status_marker(outcome),
                        name,
                        outcome.message()
                    ));
                }
                if let PhaseOutcome::Gate { stats, .. } = phase {
                    for s in stats {
                        output.push_str(&format!("\u{2502}     {}\n", format_stats(s)));
                    }
                }
            }
            output.push('\n');
        }

        if !summary.artifacts.is_empty() {
            output.push_str("Artifacts:\n");
            for (i, path) in summary.artifacts.iter().enumerate() {
                let connector = if i == summary.artifacts.len() - 1 {
                    "\u{2514}"
                } else {
                    "\u{251C}"
                };
                output.push_str(&format!("{}\u{2500} {}\n", connector, path.display()));
            }
        }

        output
    }

    fn format_gate_human(&self, summary: &GateSummary) -> String {
        let mut output = String::new();
        output.push_str("\u{2713} Evidence Gate\n");
        output.push_str(RULE);
        output.push_str("\n\n");
        output.push_str(&format!("Contract:  {}\n\n", summary.contract.display()));
        for s in &summary.stats {
            output.push_str(&format!("{}\n", format_stats(s)));
        }
        output
    }
}

fn status_marker(outcome: &TaskOutcome) -> &'static str {
    match outcome {
        TaskOutcome::Succeeded { .. } => "\u{2713}",
        TaskOutcome::Degraded { .. } => "\u{26A0}",
        TaskOutcome::Skipped { .. } => "-",
        TaskOutcome::Failed { .. } => "\u{2717}",
    }
}

fn format_stats(stats: &GateStats) -> String {
    format!(
        "{}: {} in, {} confident, {} manual review, {} dropped",
        stats.kind, stats.input, stats.confident, stats.manual_review, stats.dropped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::FindingKind;
    use crate::pipeline::{Phase, PipelineRun};

    fn summary() -> RunSummary {
        let run = PipelineRun::start("contracts/Bank.sol", "contract Bank {}");
        RunSummary {
            run,
            outcome: RunOutcome::Completed,
            phases: vec![
                PhaseOutcome::Detect {
                    outcome: TaskOutcome::succeeded("3 analyzer findings"),
                    findings: 3,
                },
                PhaseOutcome::Gate {
                    static_gate: TaskOutcome::succeeded("2 kept"),
                    logic_gate: TaskOutcome::skipped("no artifact"),
                    stats: vec![GateStats {
                        kind: FindingKind::Static,
                        input: 3,
                        dropped: 1,
                        confident: 2,
                        manual_review: 0,
                    }],
                },
                PhaseOutcome::Remediation {
                    refactor: TaskOutcome::failed("oracle timeout"),
                    exploit: TaskOutcome::skipped("no targets"),
                },
            ],
            artifacts: vec![PathBuf::from("SmartAudit/FINAL_AUDIT_REPORT.md")],
            duration_ms: 1500,
        }
    }

    #[test]
    fn test_format_human() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_summary(&summary())
            .unwrap();

        assert!(output.contains("Audit Complete"));
        assert!(output.contains("contracts/Bank.sol"));
        assert!(output.contains("Duration:  1.5s"));
        assert!(output.contains("3 analyzer findings"));
        assert!(output.contains("static: 3 in, 2 confident, 0 manual review, 1 dropped"));
        assert!(output.contains("\u{2717} refactor"));
        assert!(output.contains("FINAL_AUDIT_REPORT.md"));
    }

    #[test]
    fn test_format_human_aborted() {
        let mut summary = summary();
        summary.outcome = RunOutcome::Aborted {
            error: "Contract not found".to_string(),
        };
        summary.phases.clear();

        let output = OutputFormatter::new(OutputFormat::Human)
            .format_summary(&summary)
            .unwrap();
        assert!(output.contains("Audit Aborted"));
        assert!(output.contains("Error: Contract not found"));
        assert!(!output.contains("Phases:"));
    }

    #[test]
    fn test_format_json() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_summary(&summary())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["outcome"]["result"], "completed");
        assert_eq!(value["phases"][0]["phase"], "detect");
        assert_eq!(value["phases"][2]["refactor"]["status"], "failed");
        assert_eq!(value["duration_ms"], 1500);
        assert!(summary().phase(Phase::Gate).is_some());
    }

    #[test]
    fn test_format_yaml() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format_summary(&summary())
            .unwrap();
        assert!(output.contains("result: completed"));
        assert!(output.contains("phase: remediation"));
    }

    #[test]
    fn test_format_gate() {
        let gate = GateSummary {
            contract: PathBuf::from("Bank.sol"),
            stats: vec![GateStats::empty(FindingKind::Logic)],
        };

        let human = OutputFormatter::new(OutputFormat::Human).format_gate(&gate).unwrap();
        assert!(human.contains("logic: 0 in, 0 confident, 0 manual review, 0 dropped"));

        let json = OutputFormatter::new(OutputFormat::Json).format_gate(&gate).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"][0]["kind"], "logic");
    }
}
