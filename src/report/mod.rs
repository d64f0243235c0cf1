//! Final Markdown audit report
//!
//! Reads only gated artifacts. Confident findings go to "Confirmed Threats" with their
//! line and evidence; everything else goes to "Items for Manual Review". Static
//! findings the oracle judged not to be vulnerabilities are left out entirely.

use crate::findings::{
    load_or_default, Finding, Gated, LogicFinding, LogicReport, StaticReport, VerifiedFinding,
};
use crate::pipeline::{StageInput, StageTask};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::info;

/// Run metadata printed in the report header
#[derive(Debug, Clone)]
pub struct ReportHeader {
    pub contract: String,
    pub generated_at: DateTime<Utc>,
    pub source_digest: String,
    pub run_id: String,
}

struct Entry<'a> {
    finding: &'a dyn Finding,
    origin: &'static str,
    line: String,
    note: &'a str,
}

fn entry<'a, F: Finding>(gated: &'a Gated<F>, origin: &'static str) -> Entry<'a> {
    Entry {
        finding: &gated.finding,
        origin,
        line: gated.decision.line_number.to_string(),
        note: &gated.decision.gatekeeper_note,
    }
}

pub fn render_report(
    header: &ReportHeader,
    static_findings: &[Gated<VerifiedFinding>],
    logic_findings: &[Gated<LogicFinding>],
) -> String {
    let mut confirmed = Vec::new();
    let mut review = Vec::new();

    let statics = static_findings
        .iter()
        .filter(|g| g.finding.is_vulnerability)
        .map(|g| (g.is_confident(), entry(g, "Static analysis")));
    let logics = logic_findings
        .iter()
        .map(|g| (g.is_confident(), entry(g, "Logic audit")));

    for (confident, e) in statics.chain(logics) {
        if confident {
            confirmed.push(e);
        } else {
            review.push(e);
        }
    }

    let total = confirmed.len() + review.len();
    let mut output = String::new();

    output.push_str(&format!("# SmartAudit Security Report: {}\n\n", header.contract));
    output.push_str(&format!(
        "- **Date:** {}\n",
        header.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!("- **Source SHA-256:** `{}`\n", header.source_digest));
    output.push_str(&format!("- **Run:** `{}`\n", header.run_id));
    output.push_str(&format!(
        "- **Total Findings:** {} | **Confirmed:** {} | **Pending Review:** {}\n\n",
        total,
        confirmed.len(),
        review.len()
    ));

    output.push_str("## Confirmed Threats (Verified by Gatekeeper)\n\n");
    if confirmed.is_empty() {
        output.push_str("_No high-confidence vulnerabilities found._\n\n");
    }
    for (i, e) in confirmed.iter().enumerate() {
        output.push_str(&format!(
            "### {}. {} ({})\n\n",
            i + 1,
            e.finding.label(),
            e.finding.impact()
        ));
        output.push_str(&format!("- **Source:** {}\n", e.origin));
        output.push_str(&format!("- **Line:** {}\n\n", e.line));
        if let Some(citation) = e.finding.citation() {
            output.push_str(&format!("```solidity\n{}\n```\n\n", citation.trim()));
        }
        if !e.finding.explanation().is_empty() {
            output.push_str(&format!("**Analysis:** {}\n\n", e.finding.explanation()));
        }
        output.push_str(&format!("**Fix:** {}\n\n", e.finding.remediation()));
    }

    output.push_str("## Items for Manual Review\n\n");
    if review.is_empty() {
        output.push_str("_No ambiguous findings._\n\n");
    }
    for (i, e) in review.iter().enumerate() {
        output.push_str(&format!(
            "### {}. {} ({})\n\n",
            i + 1,
            e.finding.label(),
            e.finding.impact()
        ));
        output.push_str(&format!("- **Source:** {}\n", e.origin));
        let note = if e.note.is_empty() { "Check manually." } else { e.note };
        output.push_str(&format!("- **Gatekeeper Note:** {}\n\n", note));
        output.push_str(&format!("**Analysis:** {}\n\n", e.finding.explanation()));
    }

    output.trim_end().to_string() + "\n"
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownReportTask;

#[async_trait]
impl StageTask for MarkdownReportTask {
    fn name(&self) -> &str {
        "report"
    }

    async fn run(&self, input: StageInput) -> Result<Vec<PathBuf>> {
        let static_report: StaticReport<Gated<VerifiedFinding>> =
            load_or_default(&input.paths.static_report());
        let logic_report: LogicReport<Gated<LogicFinding>> =
            load_or_default(&input.paths.logic_report());

        let header = ReportHeader {
            contract: input.contract_name(),
            generated_at: Utc::now(),
            source_digest: input.run.source_digest.clone(),
            run_id: input.run.id.to_string(),
        };

        let body = render_report(
            &header,
            &static_report.verified_vulnerabilities,
            &logic_report.logic_vulnerabilities,
        );

        let path = input.paths.final_report();
        tokio::fs::create_dir_all(input.paths.root())
            .await
            .with_context(|| format!("Failed to create {}", input.paths.root().display()))?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Official report generated: {}", path.display());
        Ok(vec![path])
    }
}
