//! Compiler version selection for the analyzer
//!
//! Slither needs a `solc` matching the contract's pragma. The version is read from the
//! first `pragma solidity ...;` directive and activated with `solc-select`; failures
//! here only produce warnings, since the analyzer may still succeed with the system
//! default compiler.

use regex::Regex;
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::{info, warn};

fn pragma_regex() -> &'static Regex {
    static PRAGMA: OnceLock<Regex> = OnceLock::new();
    PRAGMA.get_or_init(|| Regex::new(r"pragma\s+solidity\s+([^;]+);").expect("valid pragma regex"))
}

fn version_regex() -> &'static Regex {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    VERSION.get_or_init(|| Regex::new(r"(\d+\.\d+\.\d+)").expect("valid version regex"))
}

/// First `x.y.z` version mentioned by the contract's solidity pragma
pub fn pragma_version(source: &str) -> Option<String> {
    let constraint = pragma_regex().captures(source)?.get(1)?.as_str().trim();
    version_regex()
        .captures(constraint)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Installs and activates `version` through `solc-select`
pub async fn select_solc(version: &str) {
    info!("Detected Solidity version: {}", version);

    for action in ["install", "use"] {
        match Command::new("solc-select")
            .args([action, version])
            .output()
            .await
        {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                warn!(
                    "solc-select {} {} failed ({}); the analyzer may fail",
                    action,
                    version,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return;
            }
            Err(e) => {
                warn!("solc-select not available: {}", e);
                return;
            }
        }
    }

    info!("Switched to solc {}", version);
}
