pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AuditArgs, CliArgs, Commands, GateArgs, OutputFormatArg};
pub use handlers::{handle_audit, handle_gate};
pub use output::{GateSummary, OutputFormat, OutputFormatter};
