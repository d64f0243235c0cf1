//! Whole-contract deep audit
//!
//! One oracle request with the entire source. Any failure (transport, no JSON, JSON of
//! the wrong shape) degrades to zero findings instead of failing the run.

use super::prompts::{logic_audit_prompt, LOGIC_AUDIT_SYSTEM_PROMPT};
use crate::findings::{write_json, ArtifactError, LogicFinding, LogicReport};
use crate::llm::{parse_embedded, ChatMessage, LLMClient, LLMRequest};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepAuditOutcome {
    pub findings: Vec<LogicFinding>,
    /// Why the audit produced nothing, when it failed
    pub failure: Option<String>,
}

#[derive(Clone)]
pub struct DeepAuditor {
    client: Arc<dyn LLMClient>,
}

impl DeepAuditor {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    pub async fn audit(&self, source: &str) -> DeepAuditOutcome {
        info!("Starting deep logic analysis");

        let request = LLMRequest::new(vec![
            ChatMessage::system(LOGIC_AUDIT_SYSTEM_PROMPT),
            ChatMessage::user(logic_audit_prompt(source)),
        ])
        .with_temperature(0.0)
        .json();

        let response = match self.client.chat(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Deep audit request failed: {}", e);
                return DeepAuditOutcome {
                    findings: Vec::new(),
                    failure: Some(e.to_string()),
                };
            }
        };

        match parse_embedded::<LogicReport<LogicFinding>>(&response.content) {
            Ok(report) => {
                info!(
                    "Logic audit complete. Found {} issues",
                    report.logic_vulnerabilities.len()
                );
                DeepAuditOutcome {
                    findings: report.logic_vulnerabilities,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("Deep audit response unusable: {}", e);
                DeepAuditOutcome {
                    findings: Vec::new(),
                    failure: Some(e.to_string()),
                }
            }
        }
    }

    /// Audits `source` and writes the pre-gate logic artifact, even when empty
    pub async fn audit_to(&self, source: &str, output: &Path) -> Result<DeepAuditOutcome, ArtifactError> {
        let outcome = self.audit(source).await;
        write_json(
            output,
            &LogicReport {
                logic_vulnerabilities: outcome.findings.clone(),
            },
        )?;
        Ok(outcome)
    }
}
