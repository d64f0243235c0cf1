//! Batch verification of analyzer findings
//!
//! Raw findings are split into contiguous chunks; each chunk goes to the oracle in one
//! request together with the full source. A chunk whose request fails in any way is
//! replaced by one placeholder per input finding, so a bad chunk never affects its
//! neighbours. Within a usable response, a single malformed item is replaced by a
//! placeholder for that item alone.

use super::prompts::{verification_prompt, VERIFICATION_SYSTEM_PROMPT};
use crate::findings::{
    load_or_default, write_json, ArtifactError, CandidateFinding, DetectorReport, StaticReport,
    VerifiedFinding,
};
use crate::llm::{parse_embedded, ChatMessage, LLMClient, LLMRequest};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Shape the oracle is asked to return for one chunk; items are decoded one at a time
#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    verified_issues: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct MinifiedFinding<'a> {
    check: &'a str,
    description: &'a str,
}

#[derive(Debug, Error)]
enum ChunkError {
    #[error("oracle request failed: {0}")]
    Backend(#[from] crate::llm::BackendError),
    #[error("unusable response: {0}")]
    Response(#[from] crate::llm::ResponseError),
    #[error("failed to encode chunk: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub findings: Vec<VerifiedFinding>,
    pub chunks: usize,
    pub failed_chunks: usize,
}

impl VerificationOutcome {
    pub fn is_degraded(&self) -> bool {
        self.failed_chunks > 0
    }
}

#[derive(Clone)]
pub struct BatchVerifier {
    client: Arc<dyn LLMClient>,
    batch_size: usize,
}

impl BatchVerifier {
    /// `batch_size` of zero is treated as one
    pub fn new(client: Arc<dyn LLMClient>, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Verifies every finding, chunk by chunk, in input order
    pub async fn verify(&self, source: &str, findings: &[CandidateFinding]) -> VerificationOutcome {
        let mut outcome = VerificationOutcome::default();

        if findings.is_empty() {
            info!("No analyzer findings to verify");
            return outcome;
        }

        info!(
            "Starting batch verification of {} findings (batch size {})",
            findings.len(),
            self.batch_size
        );

        for (index, chunk) in findings.chunks(self.batch_size).enumerate() {
            let number = index + 1;
            outcome.chunks += 1;

            match self.verify_chunk(source, chunk).await {
                Ok(verified) => {
                    debug!("Batch {} complete ({} results)", number, verified.len());
                    outcome.findings.extend(verified);
                }
                Err(e) => {
                    warn!("Batch {} failed: {}", number, e);
                    outcome.failed_chunks += 1;
                    outcome.findings.extend(
                        chunk
                            .iter()
                            .map(|f| VerifiedFinding::verification_failed(f.check_kind.clone())),
                    );
                }
            }
        }

        info!(
            chunks = outcome.chunks,
            failed = outcome.failed_chunks,
            results = outcome.findings.len(),
            "Batch verification finished"
        );
        outcome
    }

    /// Reads the detector artifact, verifies it and writes the static artifact
    pub async fn verify_artifact(
        &self,
        contract: &str,
        source: &str,
        detector_report: &Path,
        output: &Path,
    ) -> Result<VerificationOutcome, ArtifactError> {
        let report: DetectorReport = load_or_default(detector_report);
        let outcome = self.verify(source, &report.issues).await;

        write_json(
            output,
            &StaticReport {
                contract: contract.to_string(),
                verified_vulnerabilities: outcome.findings.clone(),
            },
        )?;

        Ok(outcome)
    }

    async fn verify_chunk(
        &self,
        source: &str,
        chunk: &[CandidateFinding],
    ) -> Result<Vec<VerifiedFinding>, ChunkError> {
        let minified: Vec<MinifiedFinding<'_>> = chunk
            .iter()
            .map(|f| MinifiedFinding {
                check: &f.check_kind,
                description: &f.description,
            })
            .collect();
        let payload = serde_json::to_string(&minified)?;

        let request = LLMRequest::new(vec![
            ChatMessage::system(VERIFICATION_SYSTEM_PROMPT),
            ChatMessage::user(verification_prompt(source, &payload)),
        ])
        .with_temperature(0.0)
        .json();

        let response = self.client.chat(request).await?;
        let parsed: BatchResponse = parse_embedded(&response.content)?;
        Ok(parsed.verified_issues.into_iter().map(decode_item).collect())
    }
}

/// A malformed item becomes a placeholder for its own check only
fn decode_item(item: serde_json::Value) -> VerifiedFinding {
    let check = item
        .get("original_check")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    match serde_json::from_value(item) {
        Ok(finding) => finding,
        Err(e) => {
            warn!("Discarding malformed verification result for '{}': {}", check, e);
            VerifiedFinding::verification_failed(check)
        }
    }
}
