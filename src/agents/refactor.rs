//! Automatic fixing of gated findings

use super::prompts::{refactor_prompt, REFACTOR_SYSTEM_PROMPT};
use crate::findings::{load_or_default, Gated, LogicFinding, LogicReport, StaticReport, VerifiedFinding};
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use crate::pipeline::{StageInput, StageTask};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct RefactorTask {
    client: Arc<dyn LLMClient>,
}

impl RefactorTask {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }
}

/// Bullet list of fixes from the gated artifacts
///
/// Static findings the oracle judged not to be vulnerabilities are left out; every
/// gated logic finding is kept, with unlocated ones tagged as unverified.
pub fn collect_fixes(
    static_findings: &[Gated<VerifiedFinding>],
    logic_findings: &[Gated<LogicFinding>],
) -> Vec<String> {
    let static_fixes = static_findings
        .iter()
        .filter(|g| g.finding.is_vulnerability)
        .map(|g| format!("- [Slither] {}: {}", g.finding.original_check, g.finding.remediation));

    let logic_fixes = logic_findings.iter().map(|g| {
        let tag = if g.is_confident() { "Logic" } else { "Logic, unverified" };
        format!("- [{}] {}: {}", tag, g.finding.title, g.finding.remediation)
    });

    static_fixes.chain(logic_fixes).collect()
}

/// Removes markdown code fences the oracle adds despite instructions
pub fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[async_trait]
impl StageTask for RefactorTask {
    fn name(&self) -> &str {
        "refactor"
    }

    async fn run(&self, input: StageInput) -> Result<Vec<PathBuf>> {
        let static_report: StaticReport<Gated<VerifiedFinding>> =
            load_or_default(&input.paths.static_report());
        let logic_report: LogicReport<Gated<LogicFinding>> =
            load_or_default(&input.paths.logic_report());

        let fixes = collect_fixes(
            &static_report.verified_vulnerabilities,
            &logic_report.logic_vulnerabilities,
        );
        if fixes.is_empty() {
            info!("No bugs to fix, skipping refactoring");
            return Ok(Vec::new());
        }

        info!("Applying {} fixes to the contract", fixes.len());

        let request = LLMRequest::new(vec![
            ChatMessage::system(REFACTOR_SYSTEM_PROMPT),
            ChatMessage::user(refactor_prompt(&input.source, &fixes.join("\n"))),
        ])
        .with_temperature(0.0);

        let response = self
            .client
            .chat(request)
            .await
            .context("Refactoring request failed")?;

        let fixed = strip_code_fences(&response.content);
        if fixed.is_empty() {
            anyhow::bail!("Oracle returned an empty contract");
        }

        let dir = input.paths.fixed_contracts_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("Fixed_{}", input.contract_name()));
        tokio::fs::write(&path, fixed)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Fixed contract saved to {}", path.display());
        Ok(vec![path])
    }
}
