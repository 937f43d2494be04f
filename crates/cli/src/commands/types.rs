use super::render;
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use frcpm_dependency_graph::DependencyType;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRow {
    pub name: &'static str,
    pub code: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub hard_constraint: bool,
    pub weight: f64,
}

pub fn rows() -> Vec<TypeRow> {
    DependencyType::ALL
        .into_iter()
        .map(|kind| TypeRow {
            name: kind.name(),
            code: kind.short_code(),
            display_name: kind.display_name(),
            description: kind.description(),
            hard_constraint: kind.is_hard_constraint(),
            weight: kind.weight(),
        })
        .collect()
}

pub fn execute(format: OutputFormat) -> CliResult<String> {
    render(format, &rows(), |rows| {
        let mut out = String::new();
        for row in rows {
            let soft = if row.hard_constraint { "" } else { " (advisory)" };
            let _ = writeln!(
                out,
                "{:<6} {:<17} {}{soft}",
                row.code, row.display_name, row.description
            );
        }
        out
    })
}
