use clap::{Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

use crate::config::{default_model, parse_provider, AuditConfig};

/// Evidence-gated smart contract audit pipeline
#[derive(Parser, Debug)]
#[command(
    name = "smartaudit",
    about = "Evidence-gated smart contract audit pipeline",
    version,
    author,
    long_about = "smartaudit runs a static analyzer over a Solidity contract, has an LLM oracle \
                  triage the findings and audit the business logic, keeps only claims whose \
                  cited code exists verbatim in the source, and then produces a fixed contract, \
                  red-team exploit manuals and a Markdown audit report."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Audit a Solidity contract",
        long_about = "Runs the full pipeline: Detect, Analysis, Gate, Remediation and Report. \
                      All artifacts are written under the output directory.\n\n\
                      Examples:\n  \
                      smartaudit audit contracts/Bank.sol\n  \
                      smartaudit audit Bank.sol --provider ollama --model qwen2.5-coder:7b\n  \
                      smartaudit audit Bank.sol --analyzer-output slither.json --format json"
    )]
    Audit(AuditArgs),

    #[command(
        about = "Re-run the evidence gate on existing artifacts",
        long_about = "Checks every finding's cited code against the contract source and rewrites \
                      the static and logic artifacts in place.\n\n\
                      Examples:\n  \
                      smartaudit gate Bank.sol\n  \
                      smartaudit gate Bank.sol --static out/static.json --logic out/logic.json"
    )]
    Gate(GateArgs),
}

#[derive(Parser, Debug)]
pub struct AuditArgs {
    #[arg(value_name = "CONTRACT", help = "Path to the Solidity contract")]
    pub contract: PathBuf,

    #[arg(long, value_name = "DIR", help = "Directory receiving all artifacts")]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PROVIDER",
        value_parser = parse_adapter_kind,
        help = "Oracle provider (ollama, openai, claude, gemini, grok, groq)"
    )]
    pub provider: Option<AdapterKind>,

    #[arg(long, value_name = "MODEL", help = "Model name")]
    pub model: Option<String>,

    #[arg(long, value_name = "SECONDS", help = "Per-request oracle timeout")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "N", help = "Findings per verification request")]
    pub batch_size: Option<usize>,

    #[arg(long, value_name = "COMMAND", help = "Static analyzer executable")]
    pub analyzer: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Replay a saved analyzer JSON report instead of running the analyzer"
    )]
    pub analyzer_output: Option<PathBuf>,

    #[arg(long, help = "Do not switch compilers with solc-select")]
    pub no_solc_select: bool,

    #[arg(
        short,
        long,
        value_enum,
        default_value = "human",
        help = "Output format for the run summary"
    )]
    pub format: OutputFormatArg,

    #[arg(short, long, value_name = "FILE", help = "Write the run summary to a file")]
    pub output: Option<PathBuf>,
}

impl AuditArgs {
    /// Overlays the flags that were given on top of an env-derived config
    pub fn apply(&self, config: &mut AuditConfig) {
        if let Some(provider) = self.provider {
            let model_was_default = config.model == default_model(config.provider);
            config.provider = provider;
            if model_was_default {
                config.model = default_model(provider).to_string();
            }
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(analyzer) = &self.analyzer {
            config.analyzer_command = analyzer.clone();
        }
        if let Some(report) = &self.analyzer_output {
            config.analyzer_output = Some(report.clone());
        }
        if self.no_solc_select {
            config.solc_select = false;
        }
    }
}

#[derive(Parser, Debug)]
pub struct GateArgs {
    #[arg(value_name = "CONTRACT", help = "Path to the audited Solidity contract")]
    pub contract: PathBuf,

    #[arg(
        long = "static",
        value_name = "FILE",
        help = "Static findings artifact (default: <output-dir>/outputs/verified_slither_report.json)"
    )]
    pub static_report: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Logic findings artifact (default: <output-dir>/outputs/human_audit_report.json)"
    )]
    pub logic: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Artifact directory used for defaults")]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_enum,
        default_value = "human",
        help = "Output format for the gate statistics"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    parse_provider(s).map_err(|e| e.to_string())
}
