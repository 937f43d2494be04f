use super::{label, render};
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use crate::project_file::LoadedProject;
use std::fmt::Write;
use tracing::info;

pub fn execute(project: &LoadedProject, format: OutputFormat) -> CliResult<String> {
    let analysis = project
        .graph
        .critical_path(&project.tasks, &project.schedule)?;
    info!(
        critical = analysis.critical_tasks.len(),
        duration = analysis.project_duration_hours,
        "Critical path computed"
    );

    render(format, &analysis, |analysis| {
        let chain: Vec<String> = analysis
            .critical_path
            .iter()
            .map(|&task| label(&project.tasks, task))
            .collect();
        let mut out = format!(
            "Project duration: {:.1}h\nCritical path: {}\n\n",
            analysis.project_duration_hours,
            if chain.is_empty() {
                "(none)".to_string()
            } else {
                chain.join(" → ")
            }
        );
        let _ = writeln!(
            out,
            "{:<32} {:>8} {:>8} {:>8} {:>8}",
            "Task", "Hours", "ES", "EF", "Float"
        );
        for schedule in analysis.schedules.values() {
            let marker = if schedule.critical { " *" } else { "" };
            let _ = writeln!(
                out,
                "{:<32} {:>8.1} {:>8.1} {:>8.1} {:>8.1}{marker}",
                label(&project.tasks, schedule.task),
                schedule.duration_hours,
                schedule.earliest_start,
                schedule.earliest_finish,
                schedule.total_float
            );
        }
        out
    })
}
