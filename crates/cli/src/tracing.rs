//! Log setup for the frcpm CLI
//!
//! Everything is written to stderr; stdout carries only the report.

use crate::cli::Cli;
use miette::{IntoDiagnostic, WrapErr};
use std::io;
use std::sync::OnceLock;
pub use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};
use uuid::Uuid;

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Multi-line, human-readable
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event
    Json,
    /// Source file and line on every event
    Dev,
}

/// Minimum level to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Default
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    pub level: Level,
    pub enable_file_location: bool,
    /// Explicit directives; `RUST_LOG` or the level apply when unset.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Compact,
            level: Level::WARN,
            enable_file_location: true,
            filter: None,
        }
    }
}

impl TracingConfig {
    /// `--json` wins over `--log-format`.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: if cli.json {
                TracingFormat::Json
            } else {
                cli.log_format
            },
            level: cli.level.into(),
            ..Self::default()
        }
    }
}

static CORRELATION_ID: OnceLock<Uuid> = OnceLock::new();

/// Identifier shared by every span and event of this process.
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("frcpm={level},frcpm_cli={level},frcpm_dependency_graph={level}")
}

fn env_filter(config: &TracingConfig) -> miette::Result<EnvFilter> {
    match &config.filter {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directives(config.level))),
    }
    .into_diagnostic()
    .wrap_err("Failed to create tracing filter")
}

fn fmt_layer(config: &TracingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    match config.format {
        TracingFormat::Pretty => layer
            .pretty()
            .with_target(true)
            .with_thread_names(true)
            .boxed(),
        TracingFormat::Compact => layer.compact().with_target(false).boxed(),
        TracingFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        TracingFormat::Dev => layer
            .with_file(config.enable_file_location)
            .with_line_number(config.enable_file_location)
            .with_target(true)
            .boxed(),
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails on invalid filter directives or when a subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> miette::Result<()> {
    let filter = env_filter(&config)?;
    tracing_subscriber::registry()
        .with(fmt_layer(&config).with_filter(filter))
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to install tracing subscriber")?;

    tracing::info!(
        correlation_id = %correlation_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized"
    );
    Ok(())
}

/// Span wrapping one command run.
#[macro_export]
macro_rules! command_span {
    ($command:expr) => {
        ::tracing::info_span!(
            "command",
            command = %$command,
            correlation_id = %$crate::tracing::correlation_id(),
            start_time = %::chrono::Utc::now().to_rfc3339(),
        )
    };
}
