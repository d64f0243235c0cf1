//! Subcommand handlers; each returns the process exit code

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::commands::{AuditArgs, GateArgs};
use super::output::{GateSummary, OutputFormat, OutputFormatter};
use crate::config::AuditConfig;
use crate::gate::Gatekeeper;
use crate::llm::AdapterKind;
use crate::pipeline::{ArtifactPaths, AuditPipeline, PipelineContext};
use crate::progress::LoggingHandler;

pub async fn handle_audit(args: &AuditArgs) -> i32 {
    let mut config = AuditConfig::default();
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        error!("{}", e);
        return 1;
    }
    debug!("{}", config);

    let client = match config.create_llm_client() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize oracle: {}", e);
            print_provider_hints(config.provider);
            return 1;
        }
    };

    let context = PipelineContext::from_config(&config, client);
    let pipeline = AuditPipeline::new(context).with_progress_handler(Arc::new(LoggingHandler));

    let summary = match pipeline.run(&args.contract).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Audit pipeline failed: {}", e);
            return 1;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    let rendered = match formatter.format_summary(&summary) {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Failed to format run summary: {:#}", e);
            return 1;
        }
    };

    if let Err(code) = emit(&rendered, args.output.as_deref()) {
        return code;
    }

    if summary.is_completed() {
        0
    } else {
        1
    }
}

pub fn handle_gate(args: &GateArgs) -> i32 {
    let source = match std::fs::read_to_string(&args.contract) {
        Ok(source) => source,
        Err(e) => {
            error!("Cannot read contract {}: {}", args.contract.display(), e);
            return 1;
        }
    };

    let root = args
        .output_dir
        .clone()
        .unwrap_or_else(|| AuditConfig::default().output_dir);
    let paths = ArtifactPaths::new(root);
    let static_path = args.static_report.clone().unwrap_or_else(|| paths.static_report());
    let logic_path = args.logic.clone().unwrap_or_else(|| paths.logic_report());

    let gatekeeper = Gatekeeper::new(&source);
    let mut stats = Vec::with_capacity(2);
    for result in [
        gatekeeper.validate_static_report(&static_path),
        gatekeeper.validate_logic_report(&logic_path),
    ] {
        match result {
            Ok(s) => stats.push(s),
            Err(e) => {
                error!("{}", e);
                return 1;
            }
        }
    }

    let summary = GateSummary {
        contract: args.contract.clone(),
        stats,
    };
    let format: OutputFormat = args.format.into();
    match OutputFormatter::new(format).format_gate(&summary) {
        Ok(rendered) => match emit(&rendered, None) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(e) => {
            error!("Failed to format gate summary: {:#}", e);
            1
        }
    }
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<(), i32> {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, rendered) {
                error!("Failed to write {}: {}", path.display(), e);
                return Err(1);
            }
            info!("Run summary written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn print_provider_hints(provider: AdapterKind) {
    eprintln!("\nPossible solutions:");
    match provider {
        AdapterKind::Ollama => {
            eprintln!("  - Ensure Ollama is running: ollama serve");
            eprintln!("  - Check OLLAMA_HOST environment variable (default: http://localhost:11434)");
        }
        AdapterKind::OpenAI => eprintln!("  - Set OPENAI_API_KEY environment variable"),
        AdapterKind::Anthropic => eprintln!("  - Set ANTHROPIC_API_KEY environment variable"),
        AdapterKind::Gemini => eprintln!("  - Set GEMINI_API_KEY environment variable"),
        AdapterKind::Xai => eprintln!("  - Set XAI_API_KEY environment variable"),
        AdapterKind::Groq => eprintln!("  - Set GROQ_API_KEY environment variable"),
        _ => eprintln!("  - Check provider-specific environment variables"),
    }
    eprintln!("  - Point SMARTAUDIT_API_BASE_URL at a compatible endpoint");
}
