use crate::commands::Command;
use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "frcpm")]
#[command(
    about = "Validate task dependencies and report critical paths for build-season projects"
)]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Report output format",
        default_value = "text",
        value_enum
    )]
    pub format: OutputFormat,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "Log line format (ignored with --json)",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,
}

/// How reports are printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Validate every dependency in a project file")]
    Check {
        #[arg(help = "Project file (.toml, .yaml, .yml or .json)")]
        file: PathBuf,
    },
    #[command(about = "List dependencies")]
    List {
        #[arg(help = "Project file (.toml, .yaml, .yml or .json)")]
        file: PathBuf,
        #[arg(long, short = 't', help = "Only dependencies touching this task id")]
        task: Option<u64>,
        #[arg(long, help = "Include inactive dependencies")]
        all: bool,
    },
    #[command(about = "Show ready and blocked tasks")]
    Status {
        #[arg(help = "Project file (.toml, .yaml, .yml or .json)")]
        file: PathBuf,
    },
    #[command(about = "Compute the critical path and task floats")]
    CriticalPath {
        #[arg(help = "Project file (.toml, .yaml, .yml or .json)")]
        file: PathBuf,
    },
    #[command(about = "Assess schedule risk and suggest optimizations")]
    Risk {
        #[arg(help = "Project file (.toml, .yaml, .yml or .json)")]
        file: PathBuf,
    },
    #[command(about = "Show the shortest dependency chain between two tasks")]
    Path {
        #[arg(help = "Project file (.toml, .yaml, .yml or .json)")]
        file: PathBuf,
        #[arg(help = "Starting (prerequisite) task id")]
        from: u64,
        #[arg(help = "Target (dependent) task id")]
        to: u64,
    },
    #[command(about = "Describe the supported dependency types")]
    Types,
    #[command(about = "Show version information")]
    Version,
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Check { file } => Self::Check { file },
            Commands::List { file, task, all } => Self::List {
                file,
                task,
                include_inactive: all,
            },
            Commands::Status { file } => Self::Status { file },
            Commands::CriticalPath { file } => Self::CriticalPath { file },
            Commands::Risk { file } => Self::Risk { file },
            Commands::Path { file, from, to } => Self::Path { file, from, to },
            Commands::Types => Self::Types,
            Commands::Version => Self::Version,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
