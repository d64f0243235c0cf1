//! smartaudit - evidence-gated smart contract auditing
//!
//! A Solidity contract is run through a static analyzer, an LLM oracle triages those
//! findings and separately audits the business logic, and every resulting claim must
//! cite code that exists verbatim in the contract before anything downstream sees it.
//!
//! # Pipeline
//!
//! 1. **Detect**: the static analyzer produces candidate findings (the only fatal phase)
//! 2. **Analysis**: batched verification and the deep logic audit run concurrently
//! 3. **Gate**: citations are located in the source; unsupported claims are dropped or
//!    demoted to manual review
//! 4. **Remediation**: a fixed contract and red-team exploit manuals, concurrently
//! 5. **Report**: the final Markdown audit report
//!
//! # Example Usage
//!
//! ```ignore
//! use smartaudit::{AuditConfig, AuditPipeline, PipelineContext};
//! use std::path::Path;
//!
//! let config = AuditConfig::default();
//! let client = config.create_llm_client()?;
//! let pipeline = AuditPipeline::new(PipelineContext::from_config(&config, client));
//! let summary = pipeline.run(Path::new("contracts/Bank.sol")).await?;
//! println!("completed: {}", summary.is_completed());
//! ```
//!
//! # Project Structure
//!
//! - [`detect`]: static analyzer integration
//! - [`agents`]: oracle-backed verification, logic audit, refactor and exploit tasks
//! - [`evidence`] and [`gate`]: verbatim citation matching and the evidence gate
//! - [`pipeline`]: run state, phase orchestration and artifact layout
//! - [`report`]: the final Markdown report

pub mod agents;
pub mod cli;
pub mod config;
pub mod detect;
pub mod evidence;
pub mod findings;
pub mod gate;
pub mod llm;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod util;

pub use config::{AuditConfig, ConfigError};
pub use findings::{Confidence, GateDecision, Gated, LineLocation};
pub use gate::{GateStats, Gatekeeper};
pub use llm::{BackendError, LLMClient};
pub use pipeline::{AuditPipeline, PipelineContext, RunSummary};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "smartaudit");
    }
}
