//! Traversal algorithms over "depends on" relationships.
//!
//! Every search here keeps an explicit visited set, so work is bounded by
//! O(V+E) and terminates even when the data already contains a cycle.

use crate::TaskId;
use std::collections::{HashMap, HashSet};

/// Task ids ordered so that every prerequisite precedes its dependents.
pub type TopologicalOrder = Vec<TaskId>;

/// Find a chain of "depends on" links leading from `from` to `to`.
///
/// `prerequisites_of` returns the direct prerequisites of a task. The
/// returned path starts with `from` and ends with `to`; `Some(vec![from])`
/// when both are the same task.
pub fn find_dependency_path<F, I>(from: TaskId, to: TaskId, mut prerequisites_of: F) -> Option<Vec<TaskId>>
where
    F: FnMut(TaskId) -> I,
    I: IntoIterator<Item = TaskId>,
{
    if from == to {
        return Some(vec![from]);
    }

    let mut parent: HashMap<TaskId, TaskId> = HashMap::new();
    let mut visited = HashSet::from([from]);
    let mut stack = vec![from];

    while let Some(current) = stack.pop() {
        for next in prerequisites_of(current) {
            if !visited.insert(next) {
                continue;
            }
            parent.insert(next, current);
            if next == to {
                return Some(unwind_path(&parent, from, to));
            }
            stack.push(next);
        }
    }

    None
}

/// Whether `task` depends on `target` through any chain of prerequisites.
pub fn has_transitive_dependency<F, I>(task: TaskId, target: TaskId, prerequisites_of: F) -> bool
where
    F: FnMut(TaskId) -> I,
    I: IntoIterator<Item = TaskId>,
{
    find_dependency_path(task, target, prerequisites_of).is_some()
}

/// Compute the transitive closure of dependencies from an initial set.
///
/// Returns the initial tasks plus every task reachable through `next_of`.
pub fn compute_transitive_closure<F, I>(
    initial: impl IntoIterator<Item = TaskId>,
    mut next_of: F,
) -> HashSet<TaskId>
where
    F: FnMut(TaskId) -> I,
    I: IntoIterator<Item = TaskId>,
{
    let mut all = HashSet::new();
    let mut frontier = Vec::new();

    for task in initial {
        if all.insert(task) {
            frontier.push(task);
        }
    }

    while let Some(task) = frontier.pop() {
        for next in next_of(task) {
            if all.insert(next) {
                frontier.push(next);
            }
        }
    }

    all
}

fn unwind_path(parent: &HashMap<TaskId, TaskId>, from: TaskId, to: TaskId) -> Vec<TaskId> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        match parent.get(&current) {
            Some(&previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
