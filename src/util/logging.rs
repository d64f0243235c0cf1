//! Structured logging setup for smartaudit
//!
//! Console output by default, JSON output on request, both on stderr. `RUST_LOG` takes precedence over
//! the configured level when set. Initialization happens at most once per process.
//!
//! # Example
//!
//! ```no_run
//! use smartaudit::util::{init_logging, LoggingConfig};
//! use tracing::Level;
//!
//! init_logging(LoggingConfig::with_level(Level::DEBUG));
//! tracing::info!(contract = "Bank.sol", "Audit started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Dependencies that are noisy at info level
const QUIET_TARGETS: &[&str] = &["h2=warn", "hyper=warn", "hyper_util=warn", "reqwest=warn"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level for smartaudit's own targets
    pub level: Level,

    /// Emit one JSON object per event
    pub use_json: bool,

    /// Include the module target (e.g., smartaudit::gate) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Reads `SMARTAUDIT_LOG_LEVEL` and `SMARTAUDIT_LOG_JSON`
    pub fn from_env() -> Self {
        let level = env::var("SMARTAUDIT_LOG_LEVEL")
            .map(|v| parse_level(&v))
            .unwrap_or(Level::INFO);

        let use_json = env::var("SMARTAUDIT_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            include_thread_ids: use_json,
            ..Default::default()
        }
    }
}

/// Parses a log level (case-insensitive); unknown values fall back to INFO
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();

    if env::var("RUST_LOG").is_err() {
        if let Ok(own) = format!("smartaudit={}", level).parse::<Directive>() {
            filter = filter.add_directive(own);
        }
        for target in QUIET_TARGETS {
            if let Ok(directive) = target.parse::<Directive>() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        let result = if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    });
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}
