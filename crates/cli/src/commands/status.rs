//! `frcpm status`: which tasks can start and what holds the rest back.

use super::{label, render};
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use crate::project_file::LoadedProject;
use frcpm_dependency_graph::{DependencyId, TaskId};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub ready: Vec<TaskId>,
    pub blocked: Vec<BlockedTask>,
    #[serde(skip)]
    ready_labels: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTask {
    pub task: TaskId,
    pub blocked_by: Vec<DependencyId>,
    #[serde(skip)]
    label: String,
    #[serde(skip)]
    reasons: Vec<String>,
}

impl StatusReport {
    pub fn build(project: &LoadedProject) -> Self {
        let graph = &project.graph;
        let ready = graph.ready_tasks(&project.tasks);
        let blocked = graph
            .blocked_tasks(&project.tasks)
            .into_iter()
            .map(|(task, blocked_by)| BlockedTask {
                task,
                label: label(&project.tasks, task),
                reasons: blocked_by
                    .iter()
                    .filter_map(|&id| graph.get(id))
                    .map(|dep| dep.description(&project.tasks))
                    .collect(),
                blocked_by,
            })
            .collect();

        Self {
            ready_labels: ready.iter().map(|&task| label(&project.tasks, task)).collect(),
            ready,
            blocked,
        }
    }

    fn render_text(&self) -> String {
        let mut out = format!("Ready ({}):\n", self.ready.len());
        for ready in &self.ready_labels {
            let _ = writeln!(out, "  {ready}");
        }
        let _ = writeln!(out, "Blocked ({}):", self.blocked.len());
        for blocked in &self.blocked {
            let _ = writeln!(out, "  {}", blocked.label);
            for reason in &blocked.reasons {
                let _ = writeln!(out, "    waiting on {reason}");
            }
        }
        out
    }
}

pub fn execute(project: &LoadedProject, format: OutputFormat) -> CliResult<String> {
    let report = StatusReport::build(project);
    render(format, &report, StatusReport::render_text)
}
