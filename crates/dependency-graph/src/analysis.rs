//! Build-season analysis: readiness, blockers, risk and schedule advice.

use crate::task::task_label;
use crate::{
    DependencyGraph, DependencyId, DependencyType, Error, Result, ScheduleConfig, ScheduleTask,
    TaskDependency, TaskId, TaskProvider,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, instrument};

/// Overall project risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// No risk factors.
    Low,
    /// One or two risk factors.
    Medium,
    /// Three or more risk factors.
    High,
    /// The graph contains a cycle.
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Numbers behind a [`RiskAssessment`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Cycles among active edges.
    pub cycle_count: usize,
    /// Tasks on the critical path; zero when a cycle prevents the analysis.
    pub critical_path_length: usize,
    /// Project duration in hours, if it could be computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_duration_hours: Option<f64>,
    /// Tasks with at least one blocking dependency.
    pub blocked_task_count: usize,
    /// Active dependencies with an external-constraint lag.
    pub external_constraint_count: usize,
}

/// Result of [`DependencyGraph::assess_risk`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Overall level.
    pub level: RiskLevel,
    /// Human-readable risk factors.
    pub factors: Vec<String>,
    /// Dependents of external constraints.
    pub high_risk_tasks: Vec<TaskId>,
    /// Supporting numbers.
    pub metrics: RiskMetrics,
}

/// Result of [`DependencyGraph::optimize_schedule`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecommendations {
    /// Human-readable advice.
    pub recommendations: Vec<String>,
    /// Hours each critical task could start earlier if its long lag were trimmed.
    pub suggested_adjustments: BTreeMap<TaskId, f64>,
    /// Upper bound on the hours saved by the suggested adjustments.
    pub potential_reduction_hours: f64,
}

impl DependencyGraph {
    fn project_tasks<'a, P: TaskProvider>(&self, tasks: &'a P) -> impl Iterator<Item = &'a P::Task> {
        let project = self.project();
        tasks.tasks().filter(move |task| task.project_id() == project)
    }

    /// Incomplete project tasks with nothing blocking them, in id order.
    #[must_use]
    pub fn ready_tasks<P: TaskProvider>(&self, tasks: &P) -> Vec<TaskId> {
        let mut ready: Vec<TaskId> = self
            .project_tasks(tasks)
            .filter(|task| !task.is_completed() && self.can_task_start(tasks, task.id()))
            .map(ScheduleTask::id)
            .collect();
        ready.sort_unstable();
        ready
    }

    /// Incomplete tasks with their blocking dependencies.
    #[must_use]
    pub fn blocked_tasks<P: TaskProvider>(&self, tasks: &P) -> BTreeMap<TaskId, Vec<DependencyId>> {
        self.task_ids()
            .into_iter()
            .filter(|&task| tasks.task(task).is_some_and(|t| !t.is_completed()))
            .filter_map(|task| {
                let blocking: Vec<DependencyId> = self
                    .blocking_dependencies(tasks, task)
                    .into_iter()
                    .map(|(id, _)| id)
                    .collect();
                (!blocking.is_empty()).then_some((task, blocking))
            })
            .collect()
    }

    /// Active dependencies with a lag of at least `min_lag_hours`.
    #[must_use]
    pub fn external_constraints(&self, min_lag_hours: i32) -> Vec<(DependencyId, &TaskDependency)> {
        self.dependencies(true)
            .filter(|(_, dep)| dep.lag_hours() >= min_lag_hours)
            .collect()
    }

    /// Number of dependencies per type, including types with none.
    #[must_use]
    pub fn dependency_statistics(&self, active_only: bool) -> BTreeMap<DependencyType, usize> {
        let mut counts: BTreeMap<DependencyType, usize> =
            DependencyType::ALL.into_iter().map(|kind| (kind, 0)).collect();
        for (_, dep) in self.dependencies(active_only) {
            *counts.entry(dep.dependency_type()).or_default() += 1;
        }
        counts
    }

    /// Tasks ranked by number of active dependencies touching them.
    #[must_use]
    pub fn most_connected_tasks(&self, limit: usize) -> Vec<(TaskId, usize)> {
        let mut degree: HashMap<TaskId, usize> = HashMap::new();
        for (prerequisite, dependent, _) in self.active_edges() {
            *degree.entry(prerequisite).or_default() += 1;
            *degree.entry(dependent).or_default() += 1;
        }
        let mut ranked: Vec<(TaskId, usize)> = degree.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Rate the project's schedule risk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a bad config.
    #[instrument(skip_all, fields(project = %self.project()))]
    pub fn assess_risk<P: TaskProvider>(
        &self,
        tasks: &P,
        config: &ScheduleConfig,
    ) -> Result<RiskAssessment> {
        config.validate()?;

        let mut factors = Vec::new();
        let mut metrics = RiskMetrics::default();

        let cycles = self.detect_cycles();
        metrics.cycle_count = cycles.len();
        if !cycles.is_empty() {
            factors.push("Circular dependencies detected".to_string());
        }

        match self.critical_path(tasks, config) {
            Ok(analysis) => {
                metrics.critical_path_length = analysis.critical_path.len();
                metrics.project_duration_hours = Some(analysis.project_duration_hours);
            }
            Err(Error::CycleDetected { .. }) => {}
            Err(error) => return Err(error),
        }

        let external = self.external_constraints(config.external_constraint_lag_hours);
        metrics.external_constraint_count = external.len();
        let high_risk_tasks: Vec<TaskId> = external
            .iter()
            .map(|(_, dep)| dep.dependent())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !external.is_empty() {
            factors.push("External dependencies with significant lead times".to_string());
        }

        metrics.blocked_task_count = self.blocked_tasks(tasks).len();
        if metrics.blocked_task_count as f64
            > metrics.critical_path_length as f64 * config.blocked_ratio_threshold
        {
            factors.push("High percentage of blocked tasks".to_string());
        }

        let level = if !cycles.is_empty() {
            RiskLevel::Critical
        } else if factors.len() >= 3 {
            RiskLevel::High
        } else if factors.is_empty() {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };
        debug!(%level, factors = factors.len(), "Assessed project risk");

        Ok(RiskAssessment {
            level,
            factors,
            high_risk_tasks,
            metrics,
        })
    }

    /// Suggest ways to shorten or de-risk the schedule.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`DependencyGraph::critical_path`].
    #[instrument(skip_all, fields(project = %self.project()))]
    pub fn optimize_schedule<P: TaskProvider>(
        &self,
        tasks: &P,
        config: &ScheduleConfig,
    ) -> Result<ScheduleRecommendations> {
        let analysis = self.critical_path(tasks, config)?;
        let mut result = ScheduleRecommendations::default();

        let independent = self
            .project_tasks(tasks)
            .filter(|task| !task.is_completed())
            .filter(|task| {
                self.direct_prerequisites(task.id()).is_empty()
                    && self.direct_dependents(task.id()).is_empty()
            })
            .count();
        if independent > 0 {
            result
                .recommendations
                .push(format!("Consider parallelizing {independent} independent tasks"));
        }

        let soft: BTreeSet<TaskId> = self
            .dependencies(true)
            .filter(|(_, dep)| dep.dependency_type() == DependencyType::Soft)
            .map(|(_, dep)| dep.dependent())
            .filter(|&task| tasks.task(task).is_some_and(|t| !t.is_completed()))
            .collect();
        if !soft.is_empty() {
            result.recommendations.push(format!(
                "Review soft dependencies for {} tasks - these could potentially start earlier",
                soft.len()
            ));
        }

        for (id, dep) in self.dependencies(true) {
            let excess = dep.lag_hours() - config.long_lag_review_hours;
            if excess <= 0 {
                continue;
            }
            result.recommendations.push(format!(
                "Review lag time for dependency: {} -> {}",
                task_label(tasks, dep.prerequisite()),
                task_label(tasks, dep.dependent())
            ));
            if analysis.critical_dependencies.contains(&id) {
                let hours = f64::from(excess);
                let entry = result.suggested_adjustments.entry(dep.dependent()).or_default();
                *entry = entry.max(hours);
                result.potential_reduction_hours += hours;
            }
        }

        let procurement = self.external_constraints(config.procurement_lag_hours);
        if !procurement.is_empty() {
            result.recommendations.push(format!(
                "Start procurement/ordering early for {} external dependencies",
                procurement.len()
            ));
        }

        debug!(
            recommendations = result.recommendations.len(),
            reduction = result.potential_reduction_hours,
            "Optimized schedule"
        );
        Ok(result)
    }
}
