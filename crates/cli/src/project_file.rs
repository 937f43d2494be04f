//! Project files: tasks and dependencies in TOML, YAML or JSON.
//!
//! Dependencies are inserted in file order through the graph's validation, so
//! a file that lists an invalid edge still loads; the edge is reported as
//! rejected instead.

use crate::errors::{CliError, CliResult};
use chrono::NaiveDate;
use frcpm_dependency_graph::{
    DependencyGraph, DependencyType, Error, NewDependency, ProjectGraphs, ProjectId,
    ScheduleConfig, TaskId, TaskSnapshot,
};
use miette::SourceSpan;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Serialization format of a project file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> CliResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(CliError::invalid_argument(
                path.display().to_string(),
                Some("Project files must end in .toml, .yaml, .yml or .json".to_string()),
            )),
        }
    }
}

/// Top-level document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectFile {
    pub project: ProjectHeader,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHeader {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub id: u64,
    pub title: String,
    /// Defaults to the file's project.
    pub project: Option<u64>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub completed: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub depends_on: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEntry {
    pub dependent: u64,
    pub prerequisite: u64,
    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,
    #[serde(default)]
    pub lag_hours: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl TaskEntry {
    fn snapshot(&self, project: u64) -> TaskSnapshot {
        let mut snapshot = TaskSnapshot::new(self.id, &self.title, self.project.unwrap_or(project))
            .with_progress(if self.completed { 100 } else { self.progress })
            .with_dates(self.start_date, self.end_date)
            .depending_on(self.depends_on.iter().copied());
        if let Some(hours) = self.estimated_hours {
            snapshot = snapshot.with_estimate(hours);
        }
        snapshot
    }
}

impl DependencyEntry {
    const fn finish_to_start(dependent: u64, prerequisite: u64) -> Self {
        Self {
            dependent,
            prerequisite,
            dependency_type: DependencyType::FinishToStart,
            lag_hours: 0,
            notes: None,
            active: true,
        }
    }

    fn request(&self) -> NewDependency {
        let mut request = NewDependency::new(TaskId(self.dependent), TaskId(self.prerequisite))
            .of_type(self.dependency_type)
            .lag_hours(self.lag_hours);
        if let Some(notes) = &self.notes {
            request = request.notes(notes.clone());
        }
        request
    }
}

/// A dependency from the file that failed validation.
#[derive(Debug, Clone)]
pub struct Rejected {
    pub entry: DependencyEntry,
    pub error: Error,
}

/// A project file with its graph built.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub name: String,
    pub project: ProjectId,
    pub schedule: ScheduleConfig,
    pub tasks: BTreeMap<TaskId, TaskSnapshot>,
    pub graph: Arc<DependencyGraph>,
    pub rejected: Vec<Rejected>,
}

/// Byte offset of a 1-based line and column.
fn offset_of(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

fn point(offset: usize) -> SourceSpan {
    SourceSpan::new(offset.into(), 1_usize)
}

/// Parse a document in the given format.
pub fn parse(file_name: &str, src: &str, format: FileFormat) -> CliResult<ProjectFile> {
    let parsed = match format {
        FileFormat::Toml => toml::from_str(src).map_err(|e| {
            let span = e.span().map(|range| SourceSpan::from(range.start..range.end));
            CliError::parse_error(file_name, src, e.message(), span)
        }),
        FileFormat::Yaml => serde_yaml::from_str(src).map_err(|e| {
            let span = e.location().map(|location| point(location.index()));
            CliError::parse_error(file_name, src, e.to_string(), span)
        }),
        FileFormat::Json => serde_json::from_str(src).map_err(|e| {
            let span = (e.line() > 0).then(|| point(offset_of(src, e.line(), e.column())));
            CliError::parse_error(file_name, src, e.to_string(), span)
        }),
    };
    parsed.map_err(|error| {
        error.with_help("Expected sections: project {id, name}, schedule, tasks, dependencies")
    })
}

impl ProjectFile {
    /// Insert every dependency: tasks' `dependsOn` lists first as
    /// Finish-to-Start, then the `dependencies` section in file order.
    ///
    /// A `dependsOn` pair also listed under `dependencies` is taken from the
    /// explicit entry only.
    #[instrument(skip_all, fields(project = self.project.id))]
    pub fn build(self) -> LoadedProject {
        let project = ProjectId(self.project.id);
        let tasks: BTreeMap<TaskId, TaskSnapshot> = self
            .tasks
            .iter()
            .map(|entry| (TaskId(entry.id), entry.snapshot(self.project.id)))
            .collect();

        let explicit: HashSet<(u64, u64)> = self
            .dependencies
            .iter()
            .map(|entry| (entry.dependent, entry.prerequisite))
            .collect();
        let implicit: Vec<DependencyEntry> = self
            .tasks
            .iter()
            .flat_map(|task| {
                task.depends_on
                    .iter()
                    .map(move |&prerequisite| DependencyEntry::finish_to_start(task.id, prerequisite))
            })
            .filter(|entry| !explicit.contains(&(entry.dependent, entry.prerequisite)))
            .collect();

        let graphs = ProjectGraphs::new();
        let mut rejected = Vec::new();
        for entry in implicit.into_iter().chain(self.dependencies) {
            let request = entry.request();
            let result = if entry.active {
                graphs.add_dependency(&tasks, project, request)
            } else {
                graphs.modify(project, |graph| graph.add_inactive_dependency(&tasks, request))
            };
            if let Err(error) = result {
                warn!(
                    dependent = entry.dependent,
                    prerequisite = entry.prerequisite,
                    %error,
                    "Rejected dependency"
                );
                rejected.push(Rejected { entry, error });
            }
        }

        let graph = graphs.snapshot(project);
        debug!(
            tasks = tasks.len(),
            dependencies = graph.dependency_count(),
            rejected = rejected.len(),
            "Loaded project"
        );

        LoadedProject {
            name: self.project.name,
            project,
            schedule: self.schedule,
            tasks,
            graph,
            rejected,
        }
    }
}

/// Read, parse and build a project file.
pub async fn load(path: &Path) -> CliResult<LoadedProject> {
    let format = FileFormat::from_path(path)?;
    let src = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::file_error("read", path, e))?;
    let file_name = path.display().to_string();
    let file = parse(&file_name, &src, format)?;
    file.schedule.validate()?;
    Ok(file.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_PROJECT: &str = r#"
[project]
id = 7
name = "Drivetrain"

[schedule]
defaultTaskHours = 4

[[tasks]]
id = 1
title = "CAD gearbox"
estimatedHours = 8
completed = true

[[tasks]]
id = 2
title = "Machine plates"

[[tasks]]
id = 3
title = "Assemble"

[[dependencies]]
dependent = 2
prerequisite = 1
type = "FS"
lagHours = 24

[[dependencies]]
dependent = 3
prerequisite = 2
active = false

[[dependencies]]
dependent = 1
prerequisite = 2
"#;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.toml")).unwrap(), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("a.YML")).unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert!(FileFormat::from_path(Path::new("a.ini")).is_err());
        assert!(FileFormat::from_path(Path::new("project")).is_err());
    }

    #[test]
    fn test_build_reports_rejected_edges() {
        let file = parse("robot.toml", TOML_PROJECT, FileFormat::Toml).unwrap();
        assert!((file.schedule.default_task_hours - 4.0).abs() < f64::EPSILON);

        let loaded = file.build();
        assert_eq!(loaded.project, ProjectId(7));
        assert_eq!(loaded.name, "Drivetrain");
        assert_eq!(loaded.tasks.len(), 3);
        assert!(loaded.tasks[&TaskId(1)].completed);
        assert_eq!(loaded.graph.dependency_count(), 2);
        assert_eq!(loaded.graph.dependencies(true).count(), 1);

        assert_eq!(loaded.rejected.len(), 1);
        assert!(matches!(loaded.rejected[0].error, Error::Cycle { .. }));
    }

    #[test]
    fn test_yaml_and_json_documents() {
        let yaml = "project:\n  id: 1\n  name: Arm\ntasks:\n  - id: 1\n    title: A\n  - id: 2\n    title: B\ndependencies:\n  - dependent: 2\n    prerequisite: 1\n    type: Soft\n";
        let loaded = parse("arm.yaml", yaml, FileFormat::Yaml).unwrap().build();
        let (_, dep) = loaded.graph.dependencies(true).next().unwrap();
        assert_eq!(dep.dependency_type(), DependencyType::Soft);

        let json = r#"{"project": {"id": 1, "name": "Arm"}, "tasks": [{"id": 1, "title": "A"}, {"id": 2, "title": "B", "project": 2}], "dependencies": [{"dependent": 2, "prerequisite": 1}]}"#;
        let loaded = parse("arm.json", json, FileFormat::Json).unwrap().build();
        assert!(matches!(loaded.rejected[0].error, Error::CrossProject { .. }));
    }

    #[test]
    fn test_parse_errors_point_into_source() {
        let err = parse("bad.json", "{\n  \"project\": 5\n}", FileFormat::Json).unwrap_err();
        match err {
            CliError::ParseError { error_span, .. } => {
                let span = error_span.unwrap();
                assert!(span.offset() > 2);
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        let err = parse("bad.toml", "[project]\nid = \"x\"\n", FileFormat::Toml).unwrap_err();
        assert!(matches!(err, CliError::ParseError { error_span: Some(_), .. }));

        let err = parse("bad.yaml", "project: [1, 2\n", FileFormat::Yaml).unwrap_err();
        assert!(matches!(err, CliError::ParseError { .. }));
    }

    #[test]
    fn test_unknown_dependency_type_is_a_parse_error() {
        let json = r#"{"project": {"id": 1, "name": "Arm"}, "dependencies": [{"dependent": 2, "prerequisite": 1, "type": "sideways"}]}"#;
        let err = parse("arm.json", json, FileFormat::Json).unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_depends_on_creates_finish_to_start_edges() {
        let src = r#"
[project]
id = 1
name = "Arm"

[[tasks]]
id = 1
title = "Cut tubes"

[[tasks]]
id = 2
title = "Weld frame"
dependsOn = [1]

[[tasks]]
id = 3
title = "Mount motor"
dependsOn = [2, 1]

[[dependencies]]
dependent = 3
prerequisite = 2
type = "SS"
"#;
        let loaded = parse("arm.toml", src, FileFormat::Toml).unwrap().build();
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.graph.dependency_count(), 3);

        let kinds: Vec<(TaskId, TaskId, DependencyType)> = loaded
            .graph
            .dependencies(true)
            .map(|(_, dep)| (dep.prerequisite(), dep.dependent(), dep.dependency_type()))
            .collect();
        assert!(kinds.contains(&(TaskId(1), TaskId(2), DependencyType::FinishToStart)));
        assert!(kinds.contains(&(TaskId(1), TaskId(3), DependencyType::FinishToStart)));
        assert!(kinds.contains(&(TaskId(2), TaskId(3), DependencyType::StartToStart)));

        assert_eq!(loaded.graph.ready_tasks(&loaded.tasks), vec![TaskId(1)]);
        assert_eq!(loaded.graph.blocking_dependencies(&loaded.tasks, TaskId(2)).len(), 1);
    }

    #[test]
    fn test_depends_on_cycle_is_rejected() {
        let yaml = "project:\n  id: 1\n  name: Arm\ntasks:\n  - id: 1\n    title: A\n    dependsOn: [2]\n  - id: 2\n    title: B\n    dependsOn: [1]\n";
        let loaded = parse("arm.yaml", yaml, FileFormat::Yaml).unwrap().build();
        assert_eq!(loaded.graph.dependency_count(), 1);
        assert_eq!(loaded.rejected.len(), 1);
        assert_eq!(loaded.rejected[0].entry.dependent, 2);
        assert!(matches!(loaded.rejected[0].error, Error::Cycle { .. }));
    }

    #[test]
    fn test_inactive_back_edge_is_kept() {
        let json = r#"{"project": {"id": 1, "name": "Arm"},
            "tasks": [{"id": 1, "title": "A"}, {"id": 2, "title": "B"}],
            "dependencies": [
                {"dependent": 2, "prerequisite": 1},
                {"dependent": 1, "prerequisite": 2, "active": false}
            ]}"#;
        let loaded = parse("arm.json", json, FileFormat::Json).unwrap().build();
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.graph.dependency_count(), 2);
        assert_eq!(loaded.graph.dependencies(true).count(), 1);
        assert!(loaded.graph.validate(&loaded.tasks).is_valid);
    }

    #[test]
    fn test_offset_of() {
        let src = "ab\ncd\nef";
        assert_eq!(offset_of(src, 1, 1), 0);
        assert_eq!(offset_of(src, 2, 2), 4);
        assert_eq!(offset_of(src, 9, 9), src.len());
    }
}
