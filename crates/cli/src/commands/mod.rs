pub mod check;
pub mod critical_path;
pub mod list;
pub mod path;
pub mod risk;
pub mod status;
pub mod types;
pub mod version;

use crate::cli::OutputFormat;
use crate::errors::{CliError, CliResult};
use crate::project_file::{self, LoadedProject};
use frcpm_dependency_graph::{ScheduleTask, TaskId, TaskProvider};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub enum Command {
    Check {
        file: PathBuf,
    },
    List {
        file: PathBuf,
        task: Option<u64>,
        include_inactive: bool,
    },
    Status {
        file: PathBuf,
    },
    CriticalPath {
        file: PathBuf,
    },
    Risk {
        file: PathBuf,
    },
    Path {
        file: PathBuf,
        from: u64,
        to: u64,
    },
    Types,
    Version,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Check { .. } => "check",
            Self::List { .. } => "list",
            Self::Status { .. } => "status",
            Self::CriticalPath { .. } => "critical-path",
            Self::Risk { .. } => "risk",
            Self::Path { .. } => "path",
            Self::Types => "types",
            Self::Version => "version",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a command printed, plus the failure to report after printing it.
#[derive(Debug)]
pub struct CommandOutput {
    pub rendered: String,
    pub failure: Option<CliError>,
}

impl CommandOutput {
    const fn success(rendered: String) -> Self {
        Self {
            rendered,
            failure: None,
        }
    }
}

#[instrument(skip_all, fields(command = %command))]
pub async fn execute(command: Command, format: OutputFormat) -> CliResult<CommandOutput> {
    match command {
        Command::Check { file } => {
            let project = load(&file).await?;
            check::execute(&project, format)
        }
        Command::List {
            file,
            task,
            include_inactive,
        } => {
            let project = load(&file).await?;
            list::execute(&project, task.map(TaskId), include_inactive, format)
                .map(CommandOutput::success)
        }
        Command::Status { file } => {
            let project = load(&file).await?;
            status::execute(&project, format).map(CommandOutput::success)
        }
        Command::CriticalPath { file } => {
            let project = load(&file).await?;
            critical_path::execute(&project, format).map(CommandOutput::success)
        }
        Command::Risk { file } => {
            let project = load(&file).await?;
            risk::execute(&project, format).map(CommandOutput::success)
        }
        Command::Path { file, from, to } => {
            let project = load(&file).await?;
            path::execute(&project, TaskId(from), TaskId(to), format).map(CommandOutput::success)
        }
        Command::Types => types::execute(format).map(CommandOutput::success),
        Command::Version => version::execute(format).map(CommandOutput::success),
    }
}

async fn load(file: &Path) -> CliResult<LoadedProject> {
    let project = project_file::load(file).await?;
    debug!(
        file = %file.display(),
        project = %project.project,
        rejected = project.rejected.len(),
        "Project file loaded"
    );
    Ok(project)
}

/// Serialize `report` as pretty JSON, or hand it to `text`.
pub(crate) fn render<T: Serialize>(
    format: OutputFormat,
    report: &T,
    text: impl FnOnce(&T) -> String,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(text(report)),
    }
}

/// `'Title' (#id)`, or `#id` for a task the file does not define.
pub(crate) fn label<P: TaskProvider>(tasks: &P, id: TaskId) -> String {
    tasks
        .task(id)
        .map_or_else(|| id.to_string(), |task| format!("'{}' ({id})", task.title()))
}
