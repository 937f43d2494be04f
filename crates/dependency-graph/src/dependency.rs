//! The typed dependency edge and its per-edge predicates.

use crate::task::task_label;
use crate::traversal::find_dependency_path;
use crate::{DependencyType, Error, ProjectId, Result, ScheduleTask, TaskId, TaskProvider};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a dependency inside a [`DependencyGraph`](crate::DependencyGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyId(pub u64);

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directed, typed precedence edge: `dependent` depends on `prerequisite`.
///
/// The edge refers to tasks by id only. Predicates that need task state take
/// a [`TaskProvider`] snapshot; an endpoint the provider does not know makes
/// the edge vacuous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDependency {
    dependent: TaskId,
    prerequisite: TaskId,
    dependency_type: DependencyType,
    lag_hours: i32,
    critical_path: bool,
    active: bool,
    notes: Option<String>,
    project: ProjectId,
}

impl TaskDependency {
    /// Link `dependent` to `prerequisite`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SelfDependency`] when both are the same task and
    /// [`Error::CrossProject`] when they belong to different projects.
    pub fn new<D, P>(dependent: &D, prerequisite: &P, dependency_type: DependencyType) -> Result<Self>
    where
        D: ScheduleTask,
        P: ScheduleTask,
    {
        check_endpoints(dependent, prerequisite)?;

        Ok(Self {
            dependent: dependent.id(),
            prerequisite: prerequisite.id(),
            dependency_type,
            lag_hours: 0,
            critical_path: false,
            active: true,
            notes: None,
            project: dependent.project_id(),
        })
    }

    /// Link two tasks with the default Finish-to-Start semantics.
    ///
    /// # Errors
    ///
    /// Same as [`TaskDependency::new`].
    pub fn finish_to_start<D, P>(dependent: &D, prerequisite: &P) -> Result<Self>
    where
        D: ScheduleTask,
        P: ScheduleTask,
    {
        Self::new(dependent, prerequisite, DependencyType::FinishToStart)
    }

    /// Set the lag in hours (negative for lead time).
    #[must_use]
    pub fn with_lag(mut self, lag_hours: i32) -> Self {
        self.lag_hours = lag_hours;
        self
    }

    /// Attach an explanatory note.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// The constrained (successor) task.
    #[must_use]
    pub const fn dependent(&self) -> TaskId {
        self.dependent
    }

    /// The gating (predecessor) task.
    #[must_use]
    pub const fn prerequisite(&self) -> TaskId {
        self.prerequisite
    }

    /// Precedence semantics of the edge.
    #[must_use]
    pub const fn dependency_type(&self) -> DependencyType {
        self.dependency_type
    }

    /// Lag in hours; negative values are lead time.
    #[must_use]
    pub const fn lag_hours(&self) -> i32 {
        self.lag_hours
    }

    /// Whether the last critical-path pass put this edge on the critical path.
    #[must_use]
    pub const fn is_critical_path(&self) -> bool {
        self.critical_path
    }

    /// Inactive edges are ignored by every computation.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Explanatory notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Project both endpoints belong to.
    #[must_use]
    pub const fn project(&self) -> ProjectId {
        self.project
    }

    /// Set the lag in hours.
    pub fn set_lag_hours(&mut self, lag_hours: i32) {
        self.lag_hours = lag_hours;
    }

    /// Replace the notes.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Record the outcome of a critical-path pass.
    pub fn set_critical_path(&mut self, critical_path: bool) {
        self.critical_path = critical_path;
    }

    /// Clears the critical-path flag when the new type never constrains dates.
    pub(crate) fn set_dependency_type(&mut self, dependency_type: DependencyType) {
        self.dependency_type = dependency_type;
        if !dependency_type.is_critical_path_relevant() {
            self.critical_path = false;
        }
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Both endpoint snapshots, if the provider knows them.
    fn endpoints<'a, P: TaskProvider>(&self, tasks: &'a P) -> Option<(&'a P::Task, &'a P::Task)> {
        Some((tasks.task(self.dependent)?, tasks.task(self.prerequisite)?))
    }

    /// Whether the constraint currently holds.
    ///
    /// Finish-to-Finish and Start-to-Finish are approximated by the
    /// prerequisite's own state: a single edge cannot see the dependent's
    /// projected finish. The critical-path pass treats them precisely.
    #[must_use]
    pub fn is_satisfied<P: TaskProvider>(&self, tasks: &P) -> bool {
        if !self.active {
            return true;
        }
        let Some((_, prerequisite)) = self.endpoints(tasks) else {
            return true;
        };

        let started = prerequisite.progress() > 0 || prerequisite.is_completed();
        match self.dependency_type {
            DependencyType::FinishToStart
            | DependencyType::Blocking
            | DependencyType::FinishToFinish => prerequisite.is_completed(),
            DependencyType::StartToStart | DependencyType::StartToFinish => started,
            DependencyType::Soft => true,
        }
    }

    /// Whether this edge currently prevents the dependent from proceeding.
    #[must_use]
    pub fn is_blocking<P: TaskProvider>(&self, tasks: &P) -> bool {
        self.active && self.dependency_type != DependencyType::Soft && !self.is_satisfied(tasks)
    }

    /// Earliest moment the dependent may start according to this edge alone.
    ///
    /// `None` means the edge places no start constraint.
    #[must_use]
    pub fn earliest_dependent_start<P: TaskProvider>(&self, tasks: &P) -> Option<NaiveDateTime> {
        if !self.active {
            return None;
        }
        let (_, prerequisite) = self.endpoints(tasks)?;

        let base: NaiveDate = match self.dependency_type {
            DependencyType::FinishToStart | DependencyType::Blocking => prerequisite.end_date()?,
            DependencyType::StartToStart => prerequisite.start_date()?,
            DependencyType::FinishToFinish
            | DependencyType::StartToFinish
            | DependencyType::Soft => return None,
        };

        base.and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::hours(i64::from(self.lag_hours)))
    }

    /// Whether storing this edge would close a cycle.
    ///
    /// True when the prerequisite already depends, directly or transitively
    /// through the tasks' `pre_dependencies()`, on the dependent.
    #[must_use]
    pub fn would_create_cycle<P: TaskProvider>(&self, tasks: &P) -> bool {
        self.cycle_path(tasks).is_some()
    }

    fn cycle_path<P: TaskProvider>(&self, tasks: &P) -> Option<Vec<TaskId>> {
        if self.endpoints(tasks).is_none() {
            return None;
        }
        find_dependency_path(self.prerequisite, self.dependent, |task| {
            tasks
                .task(task)
                .into_iter()
                .flat_map(|task| task.pre_dependencies())
                .collect::<Vec<_>>()
        })
    }

    /// Weight of this edge for critical-path analysis.
    ///
    /// Zero for inactive edges and for types that are not critical-path relevant.
    #[must_use]
    pub fn critical_path_weight(&self) -> f64 {
        if !self.active || !self.dependency_type.is_critical_path_relevant() {
            return 0.0;
        }
        self.dependency_type.weight()
    }

    /// Lag suffix such as ` (+48h lag)` or ` (24h lead)`, if any.
    #[must_use]
    pub fn lag_label(&self) -> Option<String> {
        match self.lag_hours {
            0 => None,
            lag if lag > 0 => Some(format!(" (+{lag}h lag)")),
            lag => Some(format!(" ({}h lead)", lag.unsigned_abs())),
        }
    }

    /// Human-readable summary, e.g. `CAD → Machining (FS) (+24h lag)`.
    #[must_use]
    pub fn description<P: TaskProvider>(&self, tasks: &P) -> String {
        let Some((dependent, prerequisite)) = self.endpoints(tasks) else {
            return "Invalid dependency".to_string();
        };
        format!(
            "{} → {} ({}){}",
            prerequisite.title(),
            dependent.title(),
            self.dependency_type.short_code(),
            self.lag_label().unwrap_or_default()
        )
    }

    /// Re-run the self, cross-project and cycle checks against live task state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown endpoint, otherwise the
    /// first violated invariant.
    pub fn validate<P: TaskProvider>(&self, tasks: &P) -> Result<()> {
        let dependent = tasks
            .task(self.dependent)
            .ok_or(Error::TaskNotFound { task: self.dependent })?;
        let prerequisite = tasks
            .task(self.prerequisite)
            .ok_or(Error::TaskNotFound {
                task: self.prerequisite,
            })?;
        check_endpoints(dependent, prerequisite)?;

        if let Some(path) = self.cycle_path(tasks) {
            return Err(cycle_error(tasks, self.dependent, self.prerequisite, &path));
        }
        Ok(())
    }
}

/// Self and cross-project checks shared by construction and graph insertion.
pub(crate) fn check_endpoints<D, P>(dependent: &D, prerequisite: &P) -> Result<()>
where
    D: ScheduleTask,
    P: ScheduleTask,
{
    if dependent.id() == prerequisite.id() {
        return Err(Error::SelfDependency {
            task: dependent.id(),
            task_label: format!("'{}' ({})", dependent.title(), dependent.id()),
        });
    }

    if dependent.project_id() != prerequisite.project_id() {
        return Err(Error::CrossProject {
            dependent: dependent.id(),
            dependent_label: format!("'{}' ({})", dependent.title(), dependent.id()),
            dependent_project: dependent.project_id(),
            prerequisite: prerequisite.id(),
            prerequisite_label: format!("'{}' ({})", prerequisite.title(), prerequisite.id()),
            prerequisite_project: prerequisite.project_id(),
        });
    }

    Ok(())
}

pub(crate) fn cycle_error<P: TaskProvider>(
    tasks: &P,
    dependent: TaskId,
    prerequisite: TaskId,
    path: &[TaskId],
) -> Error {
    Error::Cycle {
        dependent,
        dependent_label: task_label(tasks, dependent),
        prerequisite,
        prerequisite_label: task_label(tasks, prerequisite),
        path: path.iter().map(|&task| task_label(tasks, task)).collect(),
    }
}

/// Request to add a dependency to a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDependency {
    /// The task that will depend on `prerequisite`.
    pub dependent: TaskId,
    /// The task that gates `dependent`.
    pub prerequisite: TaskId,
    /// Precedence semantics.
    #[serde(default, rename = "type")]
    pub dependency_type: DependencyType,
    /// Lag in hours.
    #[serde(default)]
    pub lag_hours: i32,
    /// Optional notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewDependency {
    /// A Finish-to-Start dependency without lag.
    #[must_use]
    pub fn new(dependent: TaskId, prerequisite: TaskId) -> Self {
        Self {
            dependent,
            prerequisite,
            dependency_type: DependencyType::default(),
            lag_hours: 0,
            notes: None,
        }
    }

    /// Set the precedence semantics.
    #[must_use]
    pub fn of_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    /// Set the lag in hours.
    #[must_use]
    pub fn lag_hours(mut self, lag_hours: i32) -> Self {
        self.lag_hours = lag_hours;
        self
    }

    /// Attach notes.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Changes applied by [`DependencyGraph::update_dependency`](crate::DependencyGraph::update_dependency).
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyUpdate {
    /// New precedence semantics.
    pub dependency_type: Option<DependencyType>,
    /// New lag in hours.
    pub lag_hours: Option<i32>,
    /// New notes; `Some(None)` clears them.
    pub notes: Option<Option<String>>,
}
