//! Error types for dependency graph operations.

use crate::{DependencyId, DependencyType, ProjectId, TaskId};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for dependency graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating or analysing task dependencies.
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum Error {
    /// The dependent and prerequisite are the same task.
    #[error("Task {task_label} cannot depend on itself")]
    #[diagnostic(
        code(frcpm::dependencies::self_dependency),
        help("Pick a different prerequisite task")
    )]
    SelfDependency {
        /// The offending task.
        task: TaskId,
        /// Label of the task for display.
        task_label: String,
    },

    /// The two tasks belong to different projects.
    #[error(
        "Task {dependent_label} (project {dependent_project}) cannot depend on {prerequisite_label} (project {prerequisite_project}): dependencies never cross projects"
    )]
    #[diagnostic(
        code(frcpm::dependencies::cross_project),
        help("Move one of the tasks into the other project, or track the relationship outside the schedule")
    )]
    CrossProject {
        /// The dependent task.
        dependent: TaskId,
        /// Label of the dependent task.
        dependent_label: String,
        /// Project of the dependent task.
        dependent_project: ProjectId,
        /// The prerequisite task.
        prerequisite: TaskId,
        /// Label of the prerequisite task.
        prerequisite_label: String,
        /// Project of the prerequisite task.
        prerequisite_project: ProjectId,
    },

    /// A task does not belong to the project the graph manages.
    #[error("Task {task_label} belongs to project {found}, not project {expected}")]
    #[diagnostic(
        code(frcpm::dependencies::foreign_project),
        help("Add the dependency to the graph of the project the tasks belong to")
    )]
    ForeignProject {
        /// The offending task.
        task: TaskId,
        /// Label of the task.
        task_label: String,
        /// Project managed by the graph.
        expected: ProjectId,
        /// Project the task belongs to.
        found: ProjectId,
    },

    /// The proposed dependency would close a cycle.
    #[error(
        "Making {dependent_label} depend on {prerequisite_label} would create a circular dependency: {}",
        path.join(" -> ")
    )]
    #[diagnostic(
        code(frcpm::dependencies::cycle),
        help("The prerequisite already depends on the dependent through the chain shown; remove or reverse one link first")
    )]
    Cycle {
        /// The dependent task of the rejected edge.
        dependent: TaskId,
        /// Label of the dependent task.
        dependent_label: String,
        /// The prerequisite task of the rejected edge.
        prerequisite: TaskId,
        /// Label of the prerequisite task.
        prerequisite_label: String,
        /// Existing chain from the prerequisite back to the dependent.
        path: Vec<String>,
    },

    /// An identical dependency already exists.
    #[error(
        "{dependent_label} already depends on {prerequisite_label} with a {dependency_type} dependency{}",
        if *active { "" } else { " (currently inactive)" }
    )]
    #[diagnostic(
        code(frcpm::dependencies::duplicate),
        help("Update or reactivate the existing dependency instead of adding a second one")
    )]
    DuplicateDependency {
        /// The existing dependency.
        existing: DependencyId,
        /// Label of the dependent task.
        dependent_label: String,
        /// Label of the prerequisite task.
        prerequisite_label: String,
        /// The duplicated dependency type.
        dependency_type: DependencyType,
        /// Whether the existing dependency is active.
        active: bool,
    },

    /// A referenced task is unknown to the task provider.
    #[error("Task {task} not found")]
    #[diagnostic(code(frcpm::dependencies::task_not_found))]
    TaskNotFound {
        /// The missing task.
        task: TaskId,
    },

    /// A referenced dependency does not exist in the graph.
    #[error("Dependency {id} not found")]
    #[diagnostic(code(frcpm::dependencies::dependency_not_found))]
    DependencyNotFound {
        /// The missing dependency.
        id: DependencyId,
    },

    /// A whole-graph computation found an existing cycle.
    #[error("Cycle detected in dependency graph: {message}")]
    #[diagnostic(
        code(frcpm::dependencies::cycle_detected),
        help("Run validation to list the cycles, then deactivate one dependency in each")
    )]
    CycleDetected {
        /// Human-readable description of the cycle.
        message: String,
    },

    /// A dependency type string matched no variant.
    #[error("Unknown dependency type '{value}'")]
    #[diagnostic(
        code(frcpm::dependencies::unknown_type),
        help("Use a name (FINISH_TO_START), a short code (FS) or a display name (Finish-to-Start)")
    )]
    UnknownDependencyType {
        /// The unrecognised input.
        value: String,
    },

    /// A scheduling tunable is out of range.
    #[error("Invalid schedule configuration: {message}")]
    #[diagnostic(code(frcpm::dependencies::invalid_config))]
    InvalidConfig {
        /// What is wrong.
        message: String,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error is one of the validation failures raised before a write.
    #[must_use]
    pub const fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::SelfDependency { .. }
                | Self::CrossProject { .. }
                | Self::ForeignProject { .. }
                | Self::Cycle { .. }
                | Self::DuplicateDependency { .. }
        )
    }
}
