//! `frcpm check`: re-validate a project file's dependency graph.

use super::{CommandOutput, label, render};
use crate::cli::OutputFormat;
use crate::errors::{CliError, CliResult};
use crate::project_file::LoadedProject;
use frcpm_dependency_graph::TaskId;
use miette::Diagnostic;
use serde::Serialize;
use std::fmt::Write;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub project: String,
    pub valid: bool,
    pub accepted: usize,
    pub rejected: Vec<RejectedDependency>,
    pub issues: Vec<String>,
    pub cycles: Vec<Vec<TaskId>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedDependency {
    pub dependent: TaskId,
    pub prerequisite: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl CheckReport {
    pub fn build(project: &LoadedProject) -> Self {
        let validation = project.graph.validate(&project.tasks);
        let rejected = project
            .rejected
            .iter()
            .map(|rejected| RejectedDependency {
                dependent: TaskId(rejected.entry.dependent),
                prerequisite: TaskId(rejected.entry.prerequisite),
                code: rejected.error.code().map(|code| code.to_string()),
                message: rejected.error.to_string(),
            })
            .collect::<Vec<_>>();

        Self {
            project: format!("{} ({})", project.name, project.project),
            valid: validation.is_valid && rejected.is_empty(),
            accepted: project.graph.dependency_count(),
            rejected,
            issues: validation.issues.iter().map(ToString::to_string).collect(),
            cycles: validation.cycles,
        }
    }

    fn render_text(&self, project: &LoadedProject) -> String {
        let mut out = format!(
            "Project {}: {} dependencies accepted, {} rejected\n",
            self.project,
            self.accepted,
            self.rejected.len()
        );
        for rejected in &self.rejected {
            let _ = writeln!(
                out,
                "  rejected {} -> {}: {}",
                label(&project.tasks, rejected.prerequisite),
                label(&project.tasks, rejected.dependent),
                rejected.message
            );
        }
        if self.issues.is_empty() {
            out.push_str("Graph is valid\n");
        } else {
            let _ = writeln!(out, "Graph has {} issues:", self.issues.len());
            for issue in &self.issues {
                let _ = writeln!(out, "  - {issue}");
            }
        }
        out
    }
}

pub fn execute(project: &LoadedProject, format: OutputFormat) -> CliResult<CommandOutput> {
    let report = CheckReport::build(project);
    info!(
        valid = report.valid,
        rejected = report.rejected.len(),
        issues = report.issues.len(),
        "Checked project"
    );

    let rendered = render(format, &report, |report| report.render_text(project))?;
    let failure = (!report.valid).then(|| CliError::CheckFailed {
        rejected: report.rejected.len(),
        issues: report.issues.len(),
    });
    Ok(CommandOutput { rendered, failure })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::project_file::{FileFormat, parse};

    #[test]
    fn test_clean_project_passes() {
        let output = execute(&fixtures::gearbox(), OutputFormat::Text).unwrap();
        assert!(output.failure.is_none());
        assert!(output.rendered.contains("5 dependencies accepted, 0 rejected"));
        assert!(output.rendered.contains("Graph is valid"));
    }

    #[test]
    fn test_rejected_edges_fail_the_check() {
        let src = format!(
            "{}\n[[dependencies]]\ndependent = 1\nprerequisite = 4\n\n[[dependencies]]\ndependent = 2\nprerequisite = 2\n",
            fixtures::GEARBOX
        );
        let project = parse("gearbox.toml", &src, FileFormat::Toml).unwrap().build();
        let output = execute(&project, OutputFormat::Text).unwrap();

        assert!(matches!(
            output.failure,
            Some(CliError::CheckFailed {
                rejected: 2,
                issues: 0
            })
        ));
        assert!(output.rendered.contains("rejected 'Assemble' (#4) -> 'CAD' (#1)"));
        assert!(output.rendered.contains("cannot depend on itself"));
    }

    #[test]
    fn test_json_report_carries_error_codes() {
        let src = format!(
            "{}\n[[dependencies]]\ndependent = 2\nprerequisite = 2\n",
            fixtures::GEARBOX
        );
        let project = parse("gearbox.toml", &src, FileFormat::Toml).unwrap().build();
        let output = execute(&project, OutputFormat::Json).unwrap();

        let json: serde_json::Value = serde_json::from_str(&output.rendered).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["accepted"], 5);
        assert_eq!(
            json["rejected"][0]["code"],
            "frcpm::dependencies::self_dependency"
        );
    }
}
