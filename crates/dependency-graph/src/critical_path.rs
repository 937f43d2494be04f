//! Critical path method over active dependencies.
//!
//! Forward and backward passes run in topological order over the graph's
//! active edges. Soft dependencies never constrain dates.

use crate::{
    DependencyGraph, DependencyId, DependencyType, ProjectId, Result, ScheduleConfig,
    ScheduleTask, TaskDependency, TaskId, TaskProvider,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Computed dates of one task, in hours from project start.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSchedule {
    /// The task.
    pub task: TaskId,
    /// Estimated or default duration.
    pub duration_hours: f64,
    /// Earliest start.
    pub earliest_start: f64,
    /// Earliest finish.
    pub earliest_finish: f64,
    /// Latest start that keeps the project finish.
    pub latest_start: f64,
    /// Latest finish that keeps the project finish.
    pub latest_finish: f64,
    /// `latest_start - earliest_start`.
    pub total_float: f64,
    /// Whether the float is zero within tolerance.
    pub critical: bool,
}

/// Outcome of a critical path computation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathAnalysis {
    /// Project analysed.
    pub project: ProjectId,
    /// Per-task dates.
    pub schedules: BTreeMap<TaskId, TaskSchedule>,
    /// Critical tasks in topological order.
    pub critical_tasks: Vec<TaskId>,
    /// Dependencies whose constraint is tight between critical tasks.
    pub critical_dependencies: Vec<DependencyId>,
    /// Heaviest chain through the critical dependencies.
    pub critical_path: Vec<TaskId>,
    /// Latest earliest-finish over all tasks.
    pub project_duration_hours: f64,
}

impl CriticalPathAnalysis {
    /// Total float of a task, if it was part of the analysis.
    #[must_use]
    pub fn task_float(&self, task: TaskId) -> Option<f64> {
        self.schedules.get(&task).map(|schedule| schedule.total_float)
    }

    /// Whether a task is critical.
    #[must_use]
    pub fn is_critical(&self, task: TaskId) -> bool {
        self.schedules.get(&task).is_some_and(|schedule| schedule.critical)
    }
}

/// A chain of tasks linked by dependencies, with its summed weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedChain {
    /// Tasks from first prerequisite to last dependent.
    pub tasks: Vec<TaskId>,
    /// Dependencies between consecutive tasks.
    pub dependencies: Vec<DependencyId>,
    /// Sum of `critical_path_weight` along the chain.
    pub weight: f64,
}

/// Earliest start the edge allows for its dependent.
fn forward_bound(
    dependency: &TaskDependency,
    prerequisite: &TaskSchedule,
    dependent_duration: f64,
) -> f64 {
    let lag = f64::from(dependency.lag_hours());
    match dependency.dependency_type() {
        DependencyType::FinishToStart | DependencyType::Blocking => {
            prerequisite.earliest_finish + lag
        }
        DependencyType::StartToStart => prerequisite.earliest_start + lag,
        DependencyType::FinishToFinish => prerequisite.earliest_finish + lag - dependent_duration,
        DependencyType::StartToFinish => prerequisite.earliest_start + lag - dependent_duration,
        DependencyType::Soft => 0.0,
    }
}

/// Latest finish the edge allows for its prerequisite.
fn backward_bound(
    dependency: &TaskDependency,
    dependent: &TaskSchedule,
    prerequisite_duration: f64,
) -> f64 {
    let lag = f64::from(dependency.lag_hours());
    match dependency.dependency_type() {
        DependencyType::FinishToStart | DependencyType::Blocking => dependent.latest_start - lag,
        DependencyType::StartToStart => dependent.latest_start - lag + prerequisite_duration,
        DependencyType::FinishToFinish => dependent.latest_finish - lag,
        DependencyType::StartToFinish => dependent.latest_finish - lag + prerequisite_duration,
        DependencyType::Soft => f64::INFINITY,
    }
}

fn constrains(dependency: &TaskDependency) -> bool {
    dependency.is_active() && dependency.dependency_type().is_critical_path_relevant()
}

impl DependencyGraph {
    /// Run the forward and backward passes.
    ///
    /// The task universe is every provider task of this project plus every
    /// task referenced by the graph.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] for a bad config and
    /// [`crate::Error::CycleDetected`] if active edges form a cycle.
    #[instrument(skip_all, fields(project = %self.project()))]
    pub fn critical_path<P: TaskProvider>(
        &self,
        tasks: &P,
        config: &ScheduleConfig,
    ) -> Result<CriticalPathAnalysis> {
        config.validate()?;

        let mut order = self.topological_order()?;
        let mut isolated: Vec<TaskId> = tasks
            .tasks()
            .filter(|task| task.project_id() == self.project() && !self.contains_task(task.id()))
            .map(ScheduleTask::id)
            .collect();
        isolated.sort_unstable();
        order.extend(isolated);

        let duration = |task: TaskId| {
            tasks
                .task(task)
                .and_then(ScheduleTask::estimated_hours)
                .filter(|hours| hours.is_finite() && *hours >= 0.0)
                .unwrap_or(config.default_task_hours)
        };

        let mut schedules: HashMap<TaskId, TaskSchedule> = HashMap::with_capacity(order.len());
        for &task in &order {
            let duration_hours = duration(task);
            let earliest_start = self
                .incoming(task)
                .into_iter()
                .filter(|(_, dep)| constrains(dep))
                .filter_map(|(_, dep)| {
                    schedules
                        .get(&dep.prerequisite())
                        .map(|prerequisite| forward_bound(dep, prerequisite, duration_hours))
                })
                .fold(0.0, f64::max);
            schedules.insert(
                task,
                TaskSchedule {
                    task,
                    duration_hours,
                    earliest_start,
                    earliest_finish: earliest_start + duration_hours,
                    latest_start: 0.0,
                    latest_finish: 0.0,
                    total_float: 0.0,
                    critical: false,
                },
            );
        }

        let project_duration_hours = schedules
            .values()
            .map(|schedule| schedule.earliest_finish)
            .fold(0.0, f64::max);

        for &task in order.iter().rev() {
            let Some(duration_hours) = schedules.get(&task).map(|s| s.duration_hours) else {
                continue;
            };
            let latest_finish = self
                .outgoing(task)
                .into_iter()
                .filter(|(_, dep)| constrains(dep))
                .filter_map(|(_, dep)| {
                    schedules
                        .get(&dep.dependent())
                        .map(|dependent| backward_bound(dep, dependent, duration_hours))
                })
                .fold(project_duration_hours, f64::min);
            if let Some(schedule) = schedules.get_mut(&task) {
                schedule.latest_finish = latest_finish;
                schedule.latest_start = latest_finish - duration_hours;
                schedule.total_float = schedule.latest_start - schedule.earliest_start;
                schedule.critical = schedule.total_float.abs() <= config.float_tolerance_hours;
            }
        }

        let critical_tasks: Vec<TaskId> = order
            .iter()
            .copied()
            .filter(|task| schedules.get(task).is_some_and(|s| s.critical))
            .collect();

        let critical_dependencies: Vec<DependencyId> = self
            .dependencies(true)
            .filter(|(_, dep)| constrains(dep))
            .filter_map(|(id, dep)| {
                let prerequisite = schedules.get(&dep.prerequisite())?;
                let dependent = schedules.get(&dep.dependent())?;
                let tight = (forward_bound(dep, prerequisite, dependent.duration_hours)
                    - dependent.earliest_start)
                    .abs()
                    <= config.float_tolerance_hours;
                (prerequisite.critical && dependent.critical && tight).then_some(id)
            })
            .collect();

        let chain = self.heaviest_chain_over(&order, |id, _| critical_dependencies.contains(&id));
        let critical_path = if chain.tasks.is_empty() {
            critical_tasks
                .iter()
                .copied()
                .filter_map(|task| schedules.get(&task))
                .fold(None::<&TaskSchedule>, |best, schedule| match best {
                    Some(best) if best.earliest_finish >= schedule.earliest_finish => Some(best),
                    _ => Some(schedule),
                })
                .map(|schedule| vec![schedule.task])
                .unwrap_or_default()
        } else {
            chain.tasks
        };

        debug!(
            tasks = schedules.len(),
            critical = critical_tasks.len(),
            duration = project_duration_hours,
            "Computed critical path"
        );

        Ok(CriticalPathAnalysis {
            project: self.project(),
            schedules: schedules.into_iter().collect(),
            critical_tasks,
            critical_dependencies,
            critical_path,
            project_duration_hours,
        })
    }

    /// Recompute the analysis and store each dependency's critical flag.
    ///
    /// Returns how many flags changed.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`DependencyGraph::critical_path`].
    pub fn update_critical_path_markers<P: TaskProvider>(
        &mut self,
        tasks: &P,
        config: &ScheduleConfig,
    ) -> Result<usize> {
        let analysis = self.critical_path(tasks, config)?;
        let ids: Vec<DependencyId> = self.dependencies(false).map(|(id, _)| id).collect();

        let mut changed = 0;
        for id in ids {
            let critical = analysis.critical_dependencies.contains(&id);
            if let Some(dependency) = self.dependency_mut(id)
                && dependency.is_critical_path() != critical
            {
                dependency.set_critical_path(critical);
                changed += 1;
            }
        }
        debug!(changed, "Updated critical path markers");
        Ok(changed)
    }

    /// Dependencies currently marked as critical.
    #[must_use]
    pub fn critical_path_dependencies(&self) -> Vec<(DependencyId, &TaskDependency)> {
        self.dependencies(false)
            .filter(|(_, dep)| dep.is_critical_path())
            .collect()
    }

    /// Maximum-weight chain over active edges with positive weight.
    ///
    /// Ignores durations; ranks chains by the summed dependency weights.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CycleDetected`] if active edges form a cycle.
    #[instrument(skip_all, fields(project = %self.project()))]
    pub fn heaviest_chain(&self) -> Result<WeightedChain> {
        let order = self.topological_order()?;
        Ok(self.heaviest_chain_over(&order, |_, dep| dep.critical_path_weight() > 0.0))
    }

    /// Longest path by weight over the edges `include` accepts, in `order`.
    fn heaviest_chain_over<F>(&self, order: &[TaskId], include: F) -> WeightedChain
    where
        F: Fn(DependencyId, &TaskDependency) -> bool,
    {
        let mut best: HashMap<TaskId, (f64, Option<(DependencyId, TaskId)>)> = HashMap::new();
        let mut end: Option<(TaskId, f64)> = None;

        for &task in order {
            let entry = self
                .incoming(task)
                .into_iter()
                .filter(|(id, dep)| include(*id, dep))
                .filter_map(|(id, dep)| {
                    best.get(&dep.prerequisite()).map(|(weight, _)| {
                        (weight + dep.critical_path_weight(), Some((id, dep.prerequisite())))
                    })
                })
                .fold((0.0, None), |acc, candidate| {
                    if candidate.0 > acc.0 { candidate } else { acc }
                });

            if entry.1.is_some() && end.is_none_or(|(_, weight)| entry.0 > weight) {
                end = Some((task, entry.0));
            }
            best.insert(task, entry);
        }

        let Some((last, weight)) = end else {
            return WeightedChain::default();
        };

        let mut tasks = vec![last];
        let mut dependencies = Vec::new();
        let mut current = last;
        while let Some((_, Some((id, previous)))) = best.get(&current) {
            dependencies.push(*id);
            tasks.push(*previous);
            current = *previous;
        }
        tasks.reverse();
        dependencies.reverse();

        WeightedChain {
            tasks,
            dependencies,
            weight,
        }
    }
}
