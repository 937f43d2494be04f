//! Whole-graph validation.
//!
//! Insertion already rejects bad edges; this module re-checks a stored graph
//! against a fresh task snapshot and reports cycles reintroduced by bulk
//! reactivation.

use crate::task::task_label;
use crate::{DependencyGraph, Error, ScheduleTask, TaskId, TaskProvider};
use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of graph validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the graph is valid (no cycles, no bad endpoints).
    pub is_valid: bool,
    /// Every problem found.
    pub issues: Vec<Error>,
    /// Concrete cycles among active edges.
    pub cycles: Vec<Vec<TaskId>>,
}

impl ValidationResult {
    /// Create a valid result.
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            is_valid: true,
            issues: vec![],
            cycles: vec![],
        }
    }

    /// Create an invalid result with issues.
    #[must_use]
    pub const fn invalid(issues: Vec<Error>, cycles: Vec<Vec<TaskId>>) -> Self {
        Self {
            is_valid: false,
            issues,
            cycles,
        }
    }
}

impl DependencyGraph {
    /// Check if active edges contain a cycle.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(self.active_graph())
    }

    /// One concrete cycle per strongly connected component of active edges.
    ///
    /// Each cycle starts at its lowest task id; every task is a prerequisite
    /// of the next one and the last is a prerequisite of the first.
    #[must_use]
    pub fn detect_cycles(&self) -> Vec<Vec<TaskId>> {
        let graph = self.active_graph();
        let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .filter_map(|component| {
                let members: HashSet<TaskId> = component.iter().map(|&node| graph[node]).collect();
                let start = members.iter().min().copied()?;
                self.cycle_through(start, &members)
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Breadth-first walk inside one component until an edge leads back to `start`.
    fn cycle_through(&self, start: TaskId, members: &HashSet<TaskId>) -> Option<Vec<TaskId>> {
        let mut predecessor: HashMap<TaskId, TaskId> = HashMap::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.direct_dependents(current) {
                if next == start {
                    let mut cycle = vec![current];
                    let mut node = current;
                    while let Some(&previous) = predecessor.get(&node) {
                        cycle.push(previous);
                        node = previous;
                    }
                    cycle.reverse();
                    return Some(cycle);
                }
                if members.contains(&next) && visited.insert(next) {
                    predecessor.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Re-check every stored dependency against `tasks`.
    ///
    /// Reports cycles among active edges, endpoints unknown to the provider,
    /// endpoints in different projects and tasks outside the graph's project.
    #[must_use]
    pub fn validate<P: TaskProvider>(&self, tasks: &P) -> ValidationResult {
        let mut issues = Vec::new();

        for (_, dependency) in self.dependencies(false) {
            let dependent = dependency.dependent();
            let prerequisite = dependency.prerequisite();
            let (Some(dependent_task), Some(prerequisite_task)) =
                (tasks.task(dependent), tasks.task(prerequisite))
            else {
                for task in [dependent, prerequisite] {
                    if tasks.task(task).is_none() {
                        issues.push(Error::TaskNotFound { task });
                    }
                }
                continue;
            };

            if dependent_task.project_id() != prerequisite_task.project_id() {
                issues.push(Error::CrossProject {
                    dependent,
                    dependent_label: task_label(tasks, dependent),
                    dependent_project: dependent_task.project_id(),
                    prerequisite,
                    prerequisite_label: task_label(tasks, prerequisite),
                    prerequisite_project: prerequisite_task.project_id(),
                });
            } else if dependent_task.project_id() != self.project() {
                issues.push(Error::ForeignProject {
                    task: dependent,
                    task_label: task_label(tasks, dependent),
                    expected: self.project(),
                    found: dependent_task.project_id(),
                });
            }
        }

        let cycles = self.detect_cycles();
        for cycle in &cycles {
            let chain: Vec<String> = cycle
                .iter()
                .chain(cycle.first())
                .map(|&task| task_label(tasks, task))
                .collect();
            issues.push(Error::CycleDetected {
                message: chain.join(" -> "),
            });
        }

        if issues.is_empty() {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid(issues, cycles)
        }
    }
}
