use super::{label, render};
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use crate::project_file::LoadedProject;
use frcpm_dependency_graph::{Error, TaskId, TaskProvider};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathReport {
    pub from: TaskId,
    pub to: TaskId,
    /// Tasks from `from` to `to`, or `None` when `to` does not depend on `from`.
    pub path: Option<Vec<TaskId>>,
}

pub fn execute(
    project: &LoadedProject,
    from: TaskId,
    to: TaskId,
    format: OutputFormat,
) -> CliResult<String> {
    for task in [from, to] {
        if project.tasks.task(task).is_none() {
            return Err(Error::TaskNotFound { task }.into());
        }
    }

    let report = PathReport {
        from,
        to,
        path: project.graph.shortest_dependency_path(from, to),
    };
    render(format, &report, |report| match &report.path {
        Some(path) => {
            let labels: Vec<String> = path.iter().map(|&task| label(&project.tasks, task)).collect();
            format!("{}\n", labels.join(" → "))
        }
        None => format!(
            "{} does not depend on {}\n",
            label(&project.tasks, to),
            label(&project.tasks, from)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::errors::CliError;

    #[test]
    fn test_chain_through_assembly() {
        let output = execute(&fixtures::gearbox(), TaskId(1), TaskId(5), OutputFormat::Text).unwrap();
        assert_eq!(
            output,
            "'CAD' (#1) → 'Machine plates' (#3) → 'Assemble' (#4) → 'Wire sensors' (#5)\n"
        );
    }

    #[test]
    fn test_unrelated_tasks() {
        let output = execute(&fixtures::gearbox(), TaskId(5), TaskId(1), OutputFormat::Text).unwrap();
        assert_eq!(output, "'CAD' (#1) does not depend on 'Wire sensors' (#5)\n");

        let output = execute(&fixtures::gearbox(), TaskId(5), TaskId(1), OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(json["path"].is_null());
    }

    #[test]
    fn test_unknown_task() {
        let err = execute(&fixtures::gearbox(), TaskId(1), TaskId(77), OutputFormat::Text).unwrap_err();
        assert!(matches!(
            err,
            CliError::Graph(Error::TaskNotFound { task: TaskId(77) })
        ));
    }
}
