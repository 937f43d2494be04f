use super::render;
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use crate::project_file::LoadedProject;
use frcpm_dependency_graph::{DependencyId, DependencyType, TaskDependency, TaskId};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRow {
    pub id: DependencyId,
    pub prerequisite: TaskId,
    pub dependent: TaskId,
    #[serde(rename = "type")]
    pub dependency_type: DependencyType,
    pub lag_hours: i32,
    pub active: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DependencyRow {
    fn new(project: &LoadedProject, id: DependencyId, dependency: &TaskDependency) -> Self {
        Self {
            id,
            prerequisite: dependency.prerequisite(),
            dependent: dependency.dependent(),
            dependency_type: dependency.dependency_type(),
            lag_hours: dependency.lag_hours(),
            active: dependency.is_active(),
            description: dependency.description(&project.tasks),
            notes: dependency.notes().map(str::to_string),
        }
    }
}

fn render_text(rows: &[DependencyRow]) -> String {
    if rows.is_empty() {
        return "No dependencies\n".to_string();
    }
    rows.iter()
        .map(|row| {
            let inactive = if row.active { "" } else { " [inactive]" };
            let notes = row
                .notes
                .as_deref()
                .map(|notes| format!(" - {notes}"))
                .unwrap_or_default();
            format!("{}  {}{inactive}{notes}\n", row.id, row.description)
        })
        .collect()
}

pub fn execute(
    project: &LoadedProject,
    task: Option<TaskId>,
    include_inactive: bool,
    format: OutputFormat,
) -> CliResult<String> {
    let rows: Vec<DependencyRow> = project
        .graph
        .dependencies(!include_inactive)
        .filter(|(_, dep)| {
            task.is_none_or(|task| dep.dependent() == task || dep.prerequisite() == task)
        })
        .map(|(id, dep)| DependencyRow::new(project, id, dep))
        .collect();
    render(format, &rows, |rows| render_text(rows))
}
