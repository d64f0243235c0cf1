use smartaudit::cli::commands::{CliArgs, Commands};
use smartaudit::cli::handlers::{handle_audit, handle_gate};
use smartaudit::util::{init_logging, parse_level, LoggingConfig};
use smartaudit::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("smartaudit v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Audit(audit_args) => handle_audit(audit_args).await,
        Commands::Gate(gate_args) => handle_gate(gate_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();

    if let Some(level_str) = &args.log_level {
        config.level = parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }

    init_logging(config);
}
