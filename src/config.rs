//! Configuration management for smartaudit
//!
//! Settings are loaded from environment variables with sensible defaults and can be
//! overridden by CLI flags before validation.
//!
//! # Environment Variables
//!
//! ## SmartAudit Configuration
//! - `SMARTAUDIT_PROVIDER`: Oracle provider (ollama|openai|claude|gemini|grok|groq) - default: "groq"
//! - `SMARTAUDIT_MODEL`: Model name - default: "llama-3.3-70b-versatile" ("qwen2.5-coder:7b" for ollama)
//! - `SMARTAUDIT_REQUEST_TIMEOUT`: Per-request oracle timeout in seconds - default: "120"
//! - `SMARTAUDIT_BATCH_SIZE`: Findings per verification request - default: "5"
//! - `SMARTAUDIT_OUTPUT_DIR`: Directory receiving all artifacts - default: "SmartAudit"
//! - `SMARTAUDIT_ANALYZER`: Static analyzer executable - default: "slither"
//! - `SMARTAUDIT_SOLC_SELECT`: Switch compiler with solc-select (true|false) - default: "true"
//! - `SMARTAUDIT_LOG_LEVEL`: Logging level - default: "info"
//! - `SMARTAUDIT_API_BASE_URL`: Custom oracle endpoint, read by the genai client
//!
//! ## GenAI Provider Configuration
//! These environment variables are read directly by the genai library:
//! - **Ollama**: `OLLAMA_HOST` (default: http://localhost:11434)
//! - **OpenAI**: `OPENAI_API_KEY`
//! - **Claude**: `ANTHROPIC_API_KEY`
//! - **Gemini**: `GEMINI_API_KEY`
//! - **Grok**: `XAI_API_KEY`
//! - **Groq**: `GROQ_API_KEY`
//!
//! # Example
//!
//! ```no_run
//! use smartaudit::AuditConfig;
//!
//! let config = AuditConfig::default();
//! config.validate().expect("Invalid configuration");
//! let client = config.create_llm_client().expect("oracle client");
//! ```

use crate::agents::DEFAULT_BATCH_SIZE;
use crate::llm::{AdapterKind, BackendError, GenAIClient, LLMClient};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_OUTPUT_DIR: &str = "SmartAudit";
const DEFAULT_ANALYZER: &str = "slither";
const MAX_BATCH_SIZE: usize = 50;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, claude, gemini, grok, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Backend initialization failed: {0}")]
    BackendInitError(#[from] BackendError),
}

/// Maps a provider name to its genai adapter
pub fn parse_provider(name: &str) -> Result<AdapterKind, ConfigError> {
    match name.to_lowercase().as_str() {
        "ollama" => Ok(AdapterKind::Ollama),
        "openai" => Ok(AdapterKind::OpenAI),
        "claude" | "anthropic" => Ok(AdapterKind::Anthropic),
        "gemini" => Ok(AdapterKind::Gemini),
        "grok" | "xai" => Ok(AdapterKind::Xai),
        "groq" => Ok(AdapterKind::Groq),
        _ => Err(ConfigError::InvalidProvider(name.to_string())),
    }
}

/// Default model for a provider
pub fn default_model(provider: AdapterKind) -> &'static str {
    match provider {
        AdapterKind::Ollama => DEFAULT_OLLAMA_MODEL,
        _ => DEFAULT_GROQ_MODEL,
    }
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Oracle provider (from genai)
    pub provider: AdapterKind,

    /// Model name to use for inference (provider-specific)
    pub model: String,

    /// Per-request oracle timeout in seconds
    pub request_timeout_secs: u64,

    /// Findings per verification request
    pub batch_size: usize,

    /// Root of all run artifacts
    pub output_dir: PathBuf,

    /// Static analyzer executable
    pub analyzer_command: String,

    /// Previously captured analyzer JSON to replay instead of running the analyzer
    pub analyzer_output: Option<PathBuf>,

    /// Run solc-select before the analyzer
    pub solc_select: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        let provider = env::var("SMARTAUDIT_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(AdapterKind::Groq);

        let model = env::var("SMARTAUDIT_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model(provider).to_string());

        let request_timeout_secs = env::var("SMARTAUDIT_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let batch_size = env::var("SMARTAUDIT_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let output_dir = env::var("SMARTAUDIT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let analyzer_command =
            env::var("SMARTAUDIT_ANALYZER").unwrap_or_else(|_| DEFAULT_ANALYZER.to_string());

        let solc_select = env::var("SMARTAUDIT_SOLC_SELECT")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let log_level = env::var("SMARTAUDIT_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider,
            model,
            request_timeout_secs,
            batch_size,
            output_dir,
            analyzer_command,
            analyzer_output: None,
            solc_select,
            log_level,
        }
    }
}

impl AuditConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name cannot be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "Batch size must be at least 1".to_string(),
            ));
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::ValidationFailed(format!(
                "Batch size cannot exceed {}",
                MAX_BATCH_SIZE
            )));
        }

        if self.analyzer_output.is_none() && self.analyzer_command.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Analyzer command cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn create_llm_client(&self) -> Result<Arc<dyn LLMClient>, ConfigError> {
        let client = GenAIClient::new(self.provider, self.model.clone(), self.request_timeout())?;
        Ok(Arc::new(client))
    }
}

impl fmt::Display for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SmartAudit Configuration:")?;
        writeln!(f, "  Provider: {:?}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Batch Size: {}", self.batch_size)?;
        writeln!(f, "  Output Dir: {}", self.output_dir.display())?;
        match &self.analyzer_output {
            Some(path) => writeln!(f, "  Analyzer: replay {}", path.display())?,
            None => writeln!(f, "  Analyzer: {}", self.analyzer_command)?,
        }
        writeln!(f, "  solc-select: {}", self.solc_select)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
