//! Identifiers and the narrow task contract consumed by the engine.
//!
//! The engine never owns or mutates tasks. Callers expose their task type
//! through [`ScheduleTask`] and hand the engine a [`TaskProvider`] snapshot
//! whenever a predicate needs live task state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Opaque identity of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

/// Opaque identity of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only view of a task as the scheduling engine sees it.
///
/// Implement this for your task type to evaluate dependencies against it.
/// `progress == 100 <=> is_completed()` is the implementor's responsibility.
pub trait ScheduleTask {
    /// Unique identity of the task.
    fn id(&self) -> TaskId;

    /// Human-readable title used in descriptions and error messages.
    fn title(&self) -> &str;

    /// Whether the task has been completed.
    fn is_completed(&self) -> bool;

    /// Progress percentage in `0..=100`.
    fn progress(&self) -> u8;

    /// Planned start date, if scheduled.
    fn start_date(&self) -> Option<NaiveDate>;

    /// Planned end date, if scheduled.
    fn end_date(&self) -> Option<NaiveDate>;

    /// Project the task belongs to.
    fn project_id(&self) -> ProjectId;

    /// Estimated effort in hours, if known.
    fn estimated_hours(&self) -> Option<f64> {
        None
    }

    /// Tasks this task already directly depends on.
    fn pre_dependencies(&self) -> impl Iterator<Item = TaskId>;
}

/// Lookup of task snapshots by identity.
pub trait TaskProvider {
    /// The task type handed out by this provider.
    type Task: ScheduleTask;

    /// Returns the task with the given id, if known.
    fn task(&self, id: TaskId) -> Option<&Self::Task>;

    /// Iterates over every known task.
    fn tasks(&self) -> impl Iterator<Item = &Self::Task>;
}

impl<T: ScheduleTask> TaskProvider for HashMap<TaskId, T> {
    type Task = T;

    fn task(&self, id: TaskId) -> Option<&T> {
        self.get(&id)
    }

    fn tasks(&self) -> impl Iterator<Item = &T> {
        self.values()
    }
}

impl<T: ScheduleTask> TaskProvider for BTreeMap<TaskId, T> {
    type Task = T;

    fn task(&self, id: TaskId) -> Option<&T> {
        self.get(&id)
    }

    fn tasks(&self) -> impl Iterator<Item = &T> {
        self.values()
    }
}

/// Formats a task as `'Title' (#id)`, or just `#id` when the provider does not know it.
pub(crate) fn task_label<P: TaskProvider>(tasks: &P, id: TaskId) -> String {
    tasks
        .task(id)
        .map_or_else(|| id.to_string(), |task| format!("'{}' ({id})", task.title()))
}

/// Plain task snapshot for callers without a task type of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Task identity.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Owning project.
    pub project_id: ProjectId,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Progress percentage.
    #[serde(default)]
    pub progress: u8,
    /// Planned start date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Planned end date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Estimated effort in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    /// Tasks this one directly depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_dependencies: Vec<TaskId>,
}

impl TaskSnapshot {
    /// Creates an unscheduled, not-started task.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>, project: u64) -> Self {
        Self {
            id: TaskId(id),
            title: title.into(),
            project_id: ProjectId(project),
            completed: false,
            progress: 0,
            start_date: None,
            end_date: None,
            estimated_hours: None,
            pre_dependencies: Vec::new(),
        }
    }

    /// Sets progress, keeping `completed` in step with `progress == 100`.
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self.completed = self.progress == 100;
        self
    }

    /// Marks the task completed.
    #[must_use]
    pub fn completed(self) -> Self {
        self.with_progress(100)
    }

    /// Sets the planned dates.
    #[must_use]
    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Sets the estimated effort.
    #[must_use]
    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Sets the direct prerequisites.
    #[must_use]
    pub fn depending_on(mut self, prerequisites: impl IntoIterator<Item = u64>) -> Self {
        self.pre_dependencies = prerequisites.into_iter().map(TaskId).collect();
        self
    }
}

impl ScheduleTask for TaskSnapshot {
    fn id(&self) -> TaskId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_completed(&self) -> bool {
        self.completed
    }

    fn progress(&self) -> u8 {
        self.progress
    }

    fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    fn project_id(&self) -> ProjectId {
        self.project_id
    }

    fn estimated_hours(&self) -> Option<f64> {
        self.estimated_hours
    }

    fn pre_dependencies(&self) -> impl Iterator<Item = TaskId> {
        self.pre_dependencies.iter().copied()
    }
}

/// Collects snapshots into a provider keyed by id.
#[must_use]
pub fn index_tasks(tasks: impl IntoIterator<Item = TaskSnapshot>) -> BTreeMap<TaskId, TaskSnapshot> {
    tasks.into_iter().map(|task| (task.id, task)).collect()
}
