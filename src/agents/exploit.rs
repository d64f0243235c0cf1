//! Red-team exploit manuals for confirmed severe logic findings

use super::prompts::{red_team_prompt, RED_TEAM_SYSTEM_PROMPT};
use crate::findings::{load_or_default, Gated, LogicFinding, LogicReport};
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use crate::pipeline::{StageInput, StageTask};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const MAX_SLUG_LEN: usize = 48;

pub struct ExploitTask {
    client: Arc<dyn LLMClient>,
}

impl ExploitTask {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    async fn write_manual(
        &self,
        source: &str,
        finding: &LogicFinding,
        path: &Path,
    ) -> Result<()> {
        let request = LLMRequest::new(vec![
            ChatMessage::system(RED_TEAM_SYSTEM_PROMPT),
            ChatMessage::user(red_team_prompt(source, &finding.title, &finding.explanation)),
        ])
        .with_temperature(0.0);

        let response = self
            .client
            .chat(request)
            .await
            .context("Exploit manual request failed")?;

        let body = response.content.trim();
        if body.is_empty() {
            anyhow::bail!("Oracle returned an empty manual");
        }

        let manual = format!(
            "# Red Team Exploit Manual: {}\n\n**Impact:** {}\n\n{}\n",
            finding.title, finding.true_impact, body
        );
        tokio::fs::write(path, manual)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Logic findings worth an exploit manual: located and Critical or High
pub fn exploit_targets(findings: &[Gated<LogicFinding>]) -> Vec<&LogicFinding> {
    findings
        .iter()
        .filter(|g| g.is_confident() && g.finding.true_impact.is_severe())
        .map(|g| &g.finding)
        .collect()
}

/// Lowercase, dash-separated file stem for a finding title
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }

    let mut slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "finding".to_string()
    } else {
        slug
    }
}

#[async_trait]
impl StageTask for ExploitTask {
    fn name(&self) -> &str {
        "exploit"
    }

    async fn run(&self, input: StageInput) -> Result<Vec<PathBuf>> {
        let report: LogicReport<Gated<LogicFinding>> = load_or_default(&input.paths.logic_report());
        let targets = exploit_targets(&report.logic_vulnerabilities);

        if targets.is_empty() {
            info!("No confirmed critical logic findings, skipping exploit generation");
            return Ok(Vec::new());
        }

        let dir = input.paths.red_team_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        info!("Generating {} exploit manuals", targets.len());

        let mut written = Vec::new();
        let mut last_error = None;
        for (index, finding) in targets.iter().enumerate() {
            let path = dir.join(format!("{:02}_{}.md", index + 1, slugify(&finding.title)));
            match self.write_manual(&input.source, finding, &path).await {
                Ok(()) => {
                    info!("Exploit manual saved to {}", path.display());
                    written.push(path);
                }
                Err(e) => {
                    warn!("Exploit manual for '{}' failed: {:#}", finding.title, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if written.is_empty() => {
                Err(e.context(format!("All {} exploit manuals failed", targets.len())))
            }
            _ => Ok(written),
        }
    }
}
