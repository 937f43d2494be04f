//! Per-project dependency graph using petgraph.
//!
//! The graph keeps every dependency record (active or not) and mirrors the
//! active ones as edges `prerequisite -> dependent` in a stable petgraph
//! arena, so traversals and critical-path passes run in O(V+E).

use crate::dependency::{check_endpoints, cycle_error};
use crate::task::task_label;
use crate::traversal::{TopologicalOrder, compute_transitive_closure, find_dependency_path};
use crate::{
    DependencyId, DependencyType, DependencyUpdate, Error, NewDependency, ProjectId, Result,
    ScheduleTask, TaskDependency, TaskId, TaskProvider,
};
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Dependencies of one project.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    project: ProjectId,
    /// Active edges only, pointing from prerequisite to dependent.
    graph: StableDiGraph<TaskId, DependencyId>,
    task_to_node: HashMap<TaskId, NodeIndex>,
    dependencies: BTreeMap<DependencyId, TaskDependency>,
    edge_of: HashMap<DependencyId, EdgeIndex>,
    next_id: u64,
}

/// Result of [`DependencyGraph::create_bulk`].
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    /// Dependencies that were stored, in request order.
    pub created: Vec<DependencyId>,
    /// Requests that were rejected, with the reason.
    pub failed: Vec<(NewDependency, Error)>,
}

impl DependencyGraph {
    /// Create an empty graph for a project.
    #[must_use]
    pub fn new(project: ProjectId) -> Self {
        Self {
            project,
            graph: StableDiGraph::new(),
            task_to_node: HashMap::new(),
            dependencies: BTreeMap::new(),
            edge_of: HashMap::new(),
            next_id: 1,
        }
    }

    /// The project this graph manages.
    #[must_use]
    pub const fn project(&self) -> ProjectId {
        self.project
    }

    /// Number of tasks that appear in at least one dependency.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.task_to_node.len()
    }

    /// Number of stored dependencies, active or not.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Check if a task appears in the graph.
    #[must_use]
    pub fn contains_task(&self, task: TaskId) -> bool {
        self.task_to_node.contains_key(&task)
    }

    /// Tasks that appear in the graph, in id order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.task_to_node.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Look up a dependency.
    #[must_use]
    pub fn get(&self, id: DependencyId) -> Option<&TaskDependency> {
        self.dependencies.get(&id)
    }

    /// Iterate over stored dependencies in id order.
    pub fn dependencies(
        &self,
        active_only: bool,
    ) -> impl Iterator<Item = (DependencyId, &TaskDependency)> {
        self.dependencies
            .iter()
            .filter(move |(_, dep)| !active_only || dep.is_active())
            .map(|(&id, dep)| (id, dep))
    }

    fn ensure_node(&mut self, task: TaskId) -> NodeIndex {
        if let Some(&node) = self.task_to_node.get(&task) {
            return node;
        }
        let node = self.graph.add_node(task);
        self.task_to_node.insert(task, node);
        node
    }

    fn link(&mut self, id: DependencyId, dependent: TaskId, prerequisite: TaskId) {
        let from = self.ensure_node(prerequisite);
        let to = self.ensure_node(dependent);
        let edge = self.graph.add_edge(from, to, id);
        self.edge_of.insert(id, edge);
    }

    fn unlink(&mut self, id: DependencyId) {
        if let Some(edge) = self.edge_of.remove(&id) {
            self.graph.remove_edge(edge);
        }
    }

    /// Drop nodes that no longer appear in any stored dependency.
    fn prune_task(&mut self, task: TaskId) {
        let referenced = self
            .dependencies
            .values()
            .any(|dep| dep.dependent() == task || dep.prerequisite() == task);
        if !referenced && let Some(node) = self.task_to_node.remove(&task) {
            self.graph.remove_node(node);
        }
    }

    /// Direct prerequisites of a task over active edges.
    #[must_use]
    pub fn direct_prerequisites(&self, task: TaskId) -> Vec<TaskId> {
        self.neighbors(task, Direction::Incoming)
    }

    /// Direct dependents of a task over active edges.
    #[must_use]
    pub fn direct_dependents(&self, task: TaskId) -> Vec<TaskId> {
        self.neighbors(task, Direction::Outgoing)
    }

    fn neighbors(&self, task: TaskId, direction: Direction) -> Vec<TaskId> {
        let Some(&node) = self.task_to_node.get(&task) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n])
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Every task `task` depends on, directly or transitively.
    #[must_use]
    pub fn all_prerequisites(&self, task: TaskId) -> BTreeSet<TaskId> {
        let mut closure =
            compute_transitive_closure([task], |current| self.direct_prerequisites(current));
        closure.remove(&task);
        closure.into_iter().collect()
    }

    /// Every task that depends on `task`, directly or transitively.
    #[must_use]
    pub fn all_dependents(&self, task: TaskId) -> BTreeSet<TaskId> {
        let mut closure =
            compute_transitive_closure([task], |current| self.direct_dependents(current));
        closure.remove(&task);
        closure.into_iter().collect()
    }

    /// Whether `task` depends on `target` through active edges.
    #[must_use]
    pub fn has_transitive_dependency(&self, task: TaskId, target: TaskId) -> bool {
        self.prerequisite_path(task, target).is_some()
    }

    fn prerequisite_path(&self, task: TaskId, target: TaskId) -> Option<Vec<TaskId>> {
        find_dependency_path(task, target, |current| self.direct_prerequisites(current))
    }

    /// Whether making `dependent` depend on `prerequisite` would close a cycle.
    #[must_use]
    pub fn would_create_cycle(&self, dependent: TaskId, prerequisite: TaskId) -> bool {
        dependent == prerequisite || self.has_transitive_dependency(prerequisite, dependent)
    }

    /// Shortest chain of dependents leading from `from` to `to`.
    ///
    /// Follows active edges from prerequisite to dependent. Returns `[from]`
    /// when both are the same task and `None` when `to` is unreachable.
    #[must_use]
    pub fn shortest_dependency_path(&self, from: TaskId, to: TaskId) -> Option<Vec<TaskId>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut predecessor: HashMap<TaskId, TaskId> = HashMap::new();
        let mut visited = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for next in self.direct_dependents(current) {
                if !visited.insert(next) {
                    continue;
                }
                predecessor.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while let Some(&previous) = predecessor.get(&node) {
                        path.push(previous);
                        node = previous;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }

    /// Active dependencies where `task` is the dependent.
    #[must_use]
    pub fn dependencies_of(&self, task: TaskId) -> Vec<(DependencyId, &TaskDependency)> {
        self.dependencies(true)
            .filter(|(_, dep)| dep.dependent() == task)
            .collect()
    }

    /// Active dependencies where `task` is the prerequisite.
    #[must_use]
    pub fn dependents_of(&self, task: TaskId) -> Vec<(DependencyId, &TaskDependency)> {
        self.dependencies(true)
            .filter(|(_, dep)| dep.prerequisite() == task)
            .collect()
    }

    /// Active dependencies currently blocking `task`.
    #[must_use]
    pub fn blocking_dependencies<P: TaskProvider>(
        &self,
        tasks: &P,
        task: TaskId,
    ) -> Vec<(DependencyId, &TaskDependency)> {
        self.dependencies_of(task)
            .into_iter()
            .filter(|(_, dep)| dep.is_blocking(tasks))
            .collect()
    }

    /// Whether nothing blocks `task` from starting.
    #[must_use]
    pub fn can_task_start<P: TaskProvider>(&self, tasks: &P, task: TaskId) -> bool {
        self.dependencies_of(task)
            .iter()
            .all(|(_, dep)| !dep.is_blocking(tasks))
    }

    /// Tasks of the graph in dependency order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if active edges form a cycle.
    pub fn topological_order(&self) -> Result<TopologicalOrder> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|node| self.graph[node]).collect())
            .map_err(|cycle| Error::CycleDetected {
                message: format!("task {} is part of a cycle", self.graph[cycle.node_id()]),
            })
    }

    pub(crate) const fn active_graph(&self) -> &StableDiGraph<TaskId, DependencyId> {
        &self.graph
    }

    pub(crate) fn active_edges(&self) -> impl Iterator<Item = (TaskId, TaskId, DependencyId)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (self.graph[edge.source()], self.graph[edge.target()], *edge.weight()))
    }

    pub(crate) fn incoming(&self, task: TaskId) -> Vec<(DependencyId, &TaskDependency)> {
        self.edges_directed(task, Direction::Incoming)
    }

    pub(crate) fn outgoing(&self, task: TaskId) -> Vec<(DependencyId, &TaskDependency)> {
        self.edges_directed(task, Direction::Outgoing)
    }

    fn edges_directed(
        &self,
        task: TaskId,
        direction: Direction,
    ) -> Vec<(DependencyId, &TaskDependency)> {
        let Some(&node) = self.task_to_node.get(&task) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, direction)
            .filter_map(|edge| {
                let id = *edge.weight();
                self.dependencies.get(&id).map(|dep| (id, dep))
            })
            .collect()
    }

    pub(crate) fn dependency_mut(&mut self, id: DependencyId) -> Option<&mut TaskDependency> {
        self.dependencies.get_mut(&id)
    }

    fn find_duplicate(
        &self,
        dependent: TaskId,
        prerequisite: TaskId,
        dependency_type: DependencyType,
        ignore: Option<DependencyId>,
    ) -> Option<(DependencyId, &TaskDependency)> {
        self.dependencies(false).find(|(id, dep)| {
            Some(*id) != ignore
                && dep.dependent() == dependent
                && dep.prerequisite() == prerequisite
                && dep.dependency_type() == dependency_type
        })
    }

    /// Resolve both endpoints and run the self and project checks.
    fn check_pair<'a, P: TaskProvider>(
        &self,
        tasks: &'a P,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> Result<(&'a P::Task, &'a P::Task)> {
        let dependent_task = tasks
            .task(dependent)
            .ok_or(Error::TaskNotFound { task: dependent })?;
        let prerequisite_task = tasks
            .task(prerequisite)
            .ok_or(Error::TaskNotFound { task: prerequisite })?;

        check_endpoints(dependent_task, prerequisite_task)?;

        if dependent_task.project_id() != self.project {
            return Err(Error::ForeignProject {
                task: dependent,
                task_label: task_label(tasks, dependent),
                expected: self.project,
                found: dependent_task.project_id(),
            });
        }

        Ok((dependent_task, prerequisite_task))
    }

    fn check_acyclic<P: TaskProvider>(
        &self,
        tasks: &P,
        dependent: TaskId,
        prerequisite: TaskId,
    ) -> Result<()> {
        match self.prerequisite_path(prerequisite, dependent) {
            Some(path) => Err(cycle_error(tasks, dependent, prerequisite, &path)),
            None => Ok(()),
        }
    }

    /// Validate and store a new dependency.
    ///
    /// Checks run in order: both tasks known, not the same task, same
    /// project (the graph's), no identical dependency, no cycle. Nothing is
    /// stored when a check fails.
    ///
    /// # Errors
    ///
    /// Returns the first violated check.
    pub fn add_dependency<P: TaskProvider>(
        &mut self,
        tasks: &P,
        request: NewDependency,
    ) -> Result<DependencyId> {
        self.insert(tasks, request, true)
    }

    /// Store a new dependency that starts out inactive.
    ///
    /// Runs every check of [`DependencyGraph::add_dependency`] except the
    /// cycle check, which applies once [`DependencyGraph::set_active`]
    /// turns the dependency on.
    ///
    /// # Errors
    ///
    /// Returns the first violated check.
    pub fn add_inactive_dependency<P: TaskProvider>(
        &mut self,
        tasks: &P,
        request: NewDependency,
    ) -> Result<DependencyId> {
        self.insert(tasks, request, false)
    }

    fn insert<P: TaskProvider>(
        &mut self,
        tasks: &P,
        request: NewDependency,
        active: bool,
    ) -> Result<DependencyId> {
        let NewDependency {
            dependent,
            prerequisite,
            dependency_type,
            lag_hours,
            notes,
        } = request;

        let (dependent_task, prerequisite_task) = self.check_pair(tasks, dependent, prerequisite)?;

        if let Some((existing, dep)) =
            self.find_duplicate(dependent, prerequisite, dependency_type, None)
        {
            return Err(Error::DuplicateDependency {
                existing,
                dependent_label: task_label(tasks, dependent),
                prerequisite_label: task_label(tasks, prerequisite),
                dependency_type,
                active: dep.is_active(),
            });
        }

        if active {
            self.check_acyclic(tasks, dependent, prerequisite)?;
        }

        let mut dependency = TaskDependency::new(dependent_task, prerequisite_task, dependency_type)?
            .with_lag(lag_hours);
        dependency.set_notes(notes);
        dependency.set_active(active);

        let id = DependencyId(self.next_id);
        self.next_id += 1;
        self.dependencies.insert(id, dependency);
        if active {
            self.link(id, dependent, prerequisite);
        }

        info!(
            dependency = %id,
            dependent = %dependent,
            prerequisite = %prerequisite,
            kind = dependency_type.short_code(),
            lag_hours,
            active,
            "Created dependency"
        );

        Ok(id)
    }

    /// Change the type, lag or notes of a dependency.
    ///
    /// Re-checks both endpoints against the live snapshot and, when the type
    /// changes, uniqueness of the new triple.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyNotFound`] or the first violated check.
    pub fn update_dependency<P: TaskProvider>(
        &mut self,
        tasks: &P,
        id: DependencyId,
        update: DependencyUpdate,
    ) -> Result<&TaskDependency> {
        let current = self
            .dependencies
            .get(&id)
            .ok_or(Error::DependencyNotFound { id })?;
        let (dependent, prerequisite) = (current.dependent(), current.prerequisite());

        self.check_pair(tasks, dependent, prerequisite)?;

        if let Some(dependency_type) = update.dependency_type
            && let Some((existing, dep)) =
                self.find_duplicate(dependent, prerequisite, dependency_type, Some(id))
        {
            return Err(Error::DuplicateDependency {
                existing,
                dependent_label: task_label(tasks, dependent),
                prerequisite_label: task_label(tasks, prerequisite),
                dependency_type,
                active: dep.is_active(),
            });
        }

        let dependency = self
            .dependencies
            .get_mut(&id)
            .ok_or(Error::DependencyNotFound { id })?;
        if let Some(dependency_type) = update.dependency_type {
            dependency.set_dependency_type(dependency_type);
        }
        if let Some(lag_hours) = update.lag_hours {
            dependency.set_lag_hours(lag_hours);
        }
        if let Some(notes) = update.notes {
            dependency.set_notes(notes);
        }
        debug!(dependency = %id, "Updated dependency");

        Ok(dependency)
    }

    /// Activate or deactivate a dependency.
    ///
    /// Activation re-runs the endpoint and cycle checks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyNotFound`] or the violated check.
    pub fn set_active<P: TaskProvider>(
        &mut self,
        tasks: &P,
        id: DependencyId,
        active: bool,
    ) -> Result<()> {
        let current = self
            .dependencies
            .get(&id)
            .ok_or(Error::DependencyNotFound { id })?;
        if current.is_active() == active {
            return Ok(());
        }
        let (dependent, prerequisite) = (current.dependent(), current.prerequisite());

        if active {
            self.check_pair(tasks, dependent, prerequisite)?;
            self.check_acyclic(tasks, dependent, prerequisite)?;
            self.link(id, dependent, prerequisite);
        } else {
            self.unlink(id);
        }

        if let Some(dependency) = self.dependencies.get_mut(&id) {
            dependency.set_active(active);
        }
        debug!(dependency = %id, active, "Changed dependency activation");
        Ok(())
    }

    /// Delete a dependency.
    pub fn remove_dependency(&mut self, id: DependencyId) -> Option<TaskDependency> {
        let removed = self.dependencies.remove(&id)?;
        self.unlink(id);
        self.prune_task(removed.dependent());
        self.prune_task(removed.prerequisite());
        debug!(dependency = %id, "Removed dependency");
        Some(removed)
    }

    /// Delete every dependency of any type from `dependent` to `prerequisite`.
    pub fn remove_dependencies_between(&mut self, dependent: TaskId, prerequisite: TaskId) -> usize {
        let ids: Vec<DependencyId> = self
            .dependencies(false)
            .filter(|(_, dep)| dep.dependent() == dependent && dep.prerequisite() == prerequisite)
            .map(|(id, _)| id)
            .collect();
        self.remove_bulk(&ids)
    }

    fn incident(&self, task: TaskId) -> Vec<DependencyId> {
        self.dependencies(false)
            .filter(|(_, dep)| dep.dependent() == task || dep.prerequisite() == task)
            .map(|(id, _)| id)
            .collect()
    }

    /// Delete every dependency touching `task`.
    pub fn remove_all_dependencies_for_task(&mut self, task: TaskId) -> usize {
        let ids = self.incident(task);
        self.remove_bulk(&ids)
    }

    /// Forget a deleted task, cascading to its incident dependencies.
    pub fn remove_task(&mut self, task: TaskId) -> usize {
        let removed = self.remove_all_dependencies_for_task(task);
        if let Some(node) = self.task_to_node.remove(&task) {
            self.graph.remove_node(node);
        }
        removed
    }

    /// Deactivate every active dependency touching `task`.
    pub fn deactivate_dependencies_for_task(&mut self, task: TaskId) -> usize {
        let ids: Vec<DependencyId> = self
            .incident(task)
            .into_iter()
            .filter(|id| self.dependencies.get(id).is_some_and(TaskDependency::is_active))
            .collect();
        for &id in &ids {
            self.unlink(id);
            if let Some(dependency) = self.dependencies.get_mut(&id) {
                dependency.set_active(false);
            }
        }
        debug!(task = %task, count = ids.len(), "Deactivated dependencies");
        ids.len()
    }

    /// Reactivate every inactive dependency touching `task`.
    ///
    /// This bulk operation does not re-run the cycle check; a cycle it
    /// reintroduces is logged and reported by [`DependencyGraph::detect_cycles`].
    pub fn reactivate_dependencies_for_task(&mut self, task: TaskId) -> usize {
        let ids: Vec<DependencyId> = self
            .incident(task)
            .into_iter()
            .filter(|id| self.dependencies.get(id).is_some_and(|dep| !dep.is_active()))
            .collect();
        for &id in &ids {
            let Some(dependency) = self.dependencies.get_mut(&id) else {
                continue;
            };
            dependency.set_active(true);
            let (dependent, prerequisite) = (dependency.dependent(), dependency.prerequisite());
            self.link(id, dependent, prerequisite);
        }
        if !ids.is_empty() && !self.detect_cycles().is_empty() {
            warn!(task = %task, "Reactivated dependencies introduced a cycle");
        }
        ids.len()
    }

    /// Add many dependencies, continuing past rejected ones.
    pub fn create_bulk<P: TaskProvider>(
        &mut self,
        tasks: &P,
        requests: impl IntoIterator<Item = NewDependency>,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for request in requests {
            match self.add_dependency(tasks, request.clone()) {
                Ok(id) => outcome.created.push(id),
                Err(error) => {
                    warn!(
                        dependent = %request.dependent,
                        prerequisite = %request.prerequisite,
                        %error,
                        "Failed to create bulk dependency"
                    );
                    outcome.failed.push((request, error));
                }
            }
        }
        outcome
    }

    /// Change the type of several dependencies; returns how many changed.
    ///
    /// A dependency whose new triple would duplicate another is skipped.
    pub fn update_dependency_types(&mut self, ids: &[DependencyId], new_type: DependencyType) -> usize {
        let mut updated = 0;
        for &id in ids {
            let Some(dep) = self.dependencies.get(&id) else {
                continue;
            };
            if dep.dependency_type() == new_type {
                continue;
            }
            if self
                .find_duplicate(dep.dependent(), dep.prerequisite(), new_type, Some(id))
                .is_some()
            {
                warn!(dependency = %id, kind = new_type.short_code(), "Skipping type change that would duplicate a dependency");
                continue;
            }
            if let Some(dep) = self.dependencies.get_mut(&id) {
                dep.set_dependency_type(new_type);
                updated += 1;
            }
        }
        updated
    }

    /// Delete several dependencies; returns how many existed.
    pub fn remove_bulk(&mut self, ids: &[DependencyId]) -> usize {
        ids.iter()
            .filter(|&&id| self.remove_dependency(id).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskSnapshot, index_tasks};

    fn project_tasks() -> BTreeMap<TaskId, TaskSnapshot> {
        index_tasks([
            TaskSnapshot::new(1, "Design gearbox", 1),
            TaskSnapshot::new(2, "Order parts", 1),
            TaskSnapshot::new(3, "Machine plates", 1),
            TaskSnapshot::new(4, "Assemble gearbox", 1),
            TaskSnapshot::new(5, "Test drive", 1),
            TaskSnapshot::new(90, "Other project", 2),
        ])
    }

    fn link(
        graph: &mut DependencyGraph,
        tasks: &BTreeMap<TaskId, TaskSnapshot>,
        dependent: u64,
        prerequisite: u64,
    ) -> Result<DependencyId> {
        graph.add_dependency(tasks, NewDependency::new(TaskId(dependent), TaskId(prerequisite)))
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = DependencyGraph::new(ProjectId(1));
        assert_eq!(graph.task_count(), 0);
        assert_eq!(graph.dependency_count(), 0);
        assert_eq!(graph.project(), ProjectId(1));
    }

    #[test]
    fn test_add_dependency_stores_edge() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let id = graph
            .add_dependency(
                &tasks,
                NewDependency::new(TaskId(3), TaskId(2))
                    .of_type(DependencyType::Blocking)
                    .lag_hours(72)
                    .notes("vendor lead time"),
            )
            .unwrap();

        let dep = graph.get(id).unwrap();
        assert_eq!(dep.dependency_type(), DependencyType::Blocking);
        assert_eq!(dep.lag_hours(), 72);
        assert_eq!(dep.notes(), Some("vendor lead time"));
        assert_eq!(dep.project(), ProjectId(1));
        assert!(graph.contains_task(TaskId(2)));
        assert_eq!(graph.direct_prerequisites(TaskId(3)), vec![TaskId(2)]);
        assert_eq!(graph.direct_dependents(TaskId(2)), vec![TaskId(3)]);
    }

    #[test]
    fn test_rejects_self_cross_and_foreign() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));

        assert!(matches!(
            link(&mut graph, &tasks, 1, 1),
            Err(Error::SelfDependency { .. })
        ));
        assert!(matches!(
            link(&mut graph, &tasks, 1, 90),
            Err(Error::CrossProject { .. })
        ));
        assert!(matches!(
            link(&mut graph, &tasks, 1, 77),
            Err(Error::TaskNotFound { task }) if task == TaskId(77)
        ));

        let foreign = index_tasks([
            TaskSnapshot::new(10, "A", 2),
            TaskSnapshot::new(11, "B", 2),
        ]);
        assert!(matches!(
            link(&mut graph, &foreign, 10, 11),
            Err(Error::ForeignProject { .. })
        ));
        assert_eq!(graph.dependency_count(), 0);
    }

    #[test]
    fn test_rejects_cycle_with_path() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        link(&mut graph, &tasks, 2, 1).unwrap();
        link(&mut graph, &tasks, 3, 2).unwrap();

        assert!(graph.would_create_cycle(TaskId(1), TaskId(3)));
        let err = link(&mut graph, &tasks, 1, 3).unwrap_err();
        match err {
            Error::Cycle { path, .. } => {
                assert_eq!(
                    path,
                    vec![
                        "'Machine plates' (#3)".to_string(),
                        "'Order parts' (#2)".to_string(),
                        "'Design gearbox' (#1)".to_string(),
                    ]
                );
            }
            other => panic!("expected cycle, got {other:?}"),
        }
        assert_eq!(graph.dependency_count(), 2);
        assert!(graph.topological_order().is_ok());
    }

    #[test]
    fn test_duplicate_triple_rejected_other_type_allowed() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let first = link(&mut graph, &tasks, 2, 1).unwrap();

        let err = link(&mut graph, &tasks, 2, 1).unwrap_err();
        assert!(matches!(err, Error::DuplicateDependency { existing, active: true, .. } if existing == first));

        let soft = graph
            .add_dependency(
                &tasks,
                NewDependency::new(TaskId(2), TaskId(1)).of_type(DependencyType::Soft),
            )
            .unwrap();
        assert_ne!(soft, first);
        assert_eq!(graph.dependency_count(), 2);
        assert_eq!(graph.direct_prerequisites(TaskId(2)), vec![TaskId(1)]);
    }

    #[test]
    fn test_inactive_duplicate_still_rejected() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let first = link(&mut graph, &tasks, 2, 1).unwrap();
        graph.set_active(&tasks, first, false).unwrap();

        let err = link(&mut graph, &tasks, 2, 1).unwrap_err();
        assert!(matches!(err, Error::DuplicateDependency { active: false, .. }));
    }

    #[test]
    fn test_inactive_edges_do_not_count_for_cycles() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let ab = link(&mut graph, &tasks, 2, 1).unwrap();
        graph.set_active(&tasks, ab, false).unwrap();

        // 1 -> 2 is allowed while 2 -> 1 is inactive
        let ba = link(&mut graph, &tasks, 1, 2).unwrap();

        // reactivating the first edge would now close the cycle
        let err = graph.set_active(&tasks, ab, true).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
        assert!(!graph.get(ab).unwrap().is_active());

        graph.remove_dependency(ba);
        graph.set_active(&tasks, ab, true).unwrap();
        assert!(graph.get(ab).unwrap().is_active());
    }

    #[test]
    fn test_update_dependency() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let fs = link(&mut graph, &tasks, 2, 1).unwrap();
        graph
            .add_dependency(
                &tasks,
                NewDependency::new(TaskId(2), TaskId(1)).of_type(DependencyType::Soft),
            )
            .unwrap();

        let updated = graph
            .update_dependency(
                &tasks,
                fs,
                DependencyUpdate {
                    dependency_type: Some(DependencyType::StartToStart),
                    lag_hours: Some(-8),
                    notes: Some(Some("overlap allowed".to_string())),
                },
            )
            .unwrap();
        assert_eq!(updated.dependency_type(), DependencyType::StartToStart);
        assert_eq!(updated.lag_hours(), -8);
        assert_eq!(updated.notes(), Some("overlap allowed"));

        let err = graph
            .update_dependency(
                &tasks,
                fs,
                DependencyUpdate {
                    dependency_type: Some(DependencyType::Soft),
                    ..DependencyUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateDependency { .. }));

        let err = graph
            .update_dependency(&tasks, DependencyId(99), DependencyUpdate::default())
            .unwrap_err();
        assert!(matches!(err, Error::DependencyNotFound { .. }));
    }

    #[test]
    fn test_transitive_queries() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        link(&mut graph, &tasks, 2, 1).unwrap();
        link(&mut graph, &tasks, 3, 1).unwrap();
        link(&mut graph, &tasks, 4, 2).unwrap();
        link(&mut graph, &tasks, 4, 3).unwrap();
        link(&mut graph, &tasks, 5, 4).unwrap();

        assert_eq!(
            graph.all_prerequisites(TaskId(5)),
            BTreeSet::from([TaskId(1), TaskId(2), TaskId(3), TaskId(4)])
        );
        assert_eq!(
            graph.all_dependents(TaskId(2)),
            BTreeSet::from([TaskId(4), TaskId(5)])
        );
        assert!(graph.has_transitive_dependency(TaskId(5), TaskId(1)));
        assert!(!graph.has_transitive_dependency(TaskId(1), TaskId(5)));

        let path = graph.shortest_dependency_path(TaskId(1), TaskId(5)).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), Some(&TaskId(1)));
        assert_eq!(path.last(), Some(&TaskId(5)));
        assert_eq!(graph.shortest_dependency_path(TaskId(5), TaskId(1)), None);
        assert_eq!(
            graph.shortest_dependency_path(TaskId(3), TaskId(3)),
            Some(vec![TaskId(3)])
        );

        let order = graph.topological_order().unwrap();
        let position = |id: u64| order.iter().position(|&t| t == TaskId(id)).unwrap();
        assert!(position(1) < position(2));
        assert!(position(3) < position(4));
        assert!(position(4) < position(5));
    }

    #[test]
    fn test_can_task_start() {
        let mut tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        link(&mut graph, &tasks, 3, 2).unwrap();
        graph
            .add_dependency(
                &tasks,
                NewDependency::new(TaskId(3), TaskId(1)).of_type(DependencyType::Soft),
            )
            .unwrap();

        assert!(!graph.can_task_start(&tasks, TaskId(3)));
        assert_eq!(graph.blocking_dependencies(&tasks, TaskId(3)).len(), 1);

        tasks.insert(TaskId(2), TaskSnapshot::new(2, "Order parts", 1).completed());
        assert!(graph.can_task_start(&tasks, TaskId(3)));
        assert!(graph.blocking_dependencies(&tasks, TaskId(3)).is_empty());
    }

    #[test]
    fn test_remove_task_cascades() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        link(&mut graph, &tasks, 2, 1).unwrap();
        link(&mut graph, &tasks, 3, 2).unwrap();
        link(&mut graph, &tasks, 5, 4).unwrap();

        assert_eq!(graph.remove_task(TaskId(2)), 2);
        assert_eq!(graph.dependency_count(), 1);
        assert!(!graph.contains_task(TaskId(2)));
        assert!(!graph.contains_task(TaskId(1)));
        assert!(graph.direct_prerequisites(TaskId(3)).is_empty());
    }

    #[test]
    fn test_bulk_operations() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let outcome = graph.create_bulk(
            &tasks,
            [
                NewDependency::new(TaskId(2), TaskId(1)),
                NewDependency::new(TaskId(3), TaskId(2)),
                NewDependency::new(TaskId(1), TaskId(3)),
                NewDependency::new(TaskId(4), TaskId(4)),
            ],
        );
        assert_eq!(outcome.created.len(), 2);
        assert_eq!(outcome.failed.len(), 2);
        assert!(matches!(outcome.failed[0].1, Error::Cycle { .. }));
        assert!(matches!(outcome.failed[1].1, Error::SelfDependency { .. }));

        let changed = graph.update_dependency_types(&outcome.created, DependencyType::Blocking);
        assert_eq!(changed, 2);
        assert!(graph
            .dependencies(true)
            .all(|(_, dep)| dep.dependency_type() == DependencyType::Blocking));

        assert_eq!(graph.remove_bulk(&[outcome.created[0], DependencyId(404)]), 1);
        assert_eq!(graph.dependency_count(), 1);
        assert_eq!(graph.remove_dependencies_between(TaskId(3), TaskId(2)), 1);
        assert_eq!(graph.dependency_count(), 0);
    }

    #[test]
    fn test_deactivate_and_reactivate_for_task() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        link(&mut graph, &tasks, 2, 1).unwrap();
        link(&mut graph, &tasks, 3, 2).unwrap();
        link(&mut graph, &tasks, 5, 4).unwrap();

        assert_eq!(graph.deactivate_dependencies_for_task(TaskId(2)), 2);
        assert_eq!(graph.dependencies(true).count(), 1);
        assert!(graph.direct_prerequisites(TaskId(3)).is_empty());
        assert_eq!(graph.deactivate_dependencies_for_task(TaskId(2)), 0);

        assert_eq!(graph.reactivate_dependencies_for_task(TaskId(2)), 2);
        assert_eq!(graph.dependencies(true).count(), 3);
        assert_eq!(graph.direct_prerequisites(TaskId(3)), vec![TaskId(2)]);
    }

    #[test]
    fn test_bulk_reactivation_can_reintroduce_cycle() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let ab = link(&mut graph, &tasks, 2, 1).unwrap();
        graph.set_active(&tasks, ab, false).unwrap();
        link(&mut graph, &tasks, 1, 2).unwrap();

        assert_eq!(graph.reactivate_dependencies_for_task(TaskId(2)), 1);
        assert!(graph.topological_order().is_err());
        // traversals still terminate on the corrupted graph
        assert!(graph.has_transitive_dependency(TaskId(1), TaskId(2)));
        assert!(!graph.has_transitive_dependency(TaskId(1), TaskId(5)));
        assert_eq!(graph.all_prerequisites(TaskId(1)), BTreeSet::from([TaskId(2)]));
    }

    #[test]
    fn test_active_edges_mirror_active_records() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let ab = link(&mut graph, &tasks, 2, 1).unwrap();
        let bc = link(&mut graph, &tasks, 3, 2).unwrap();
        graph.set_active(&tasks, ab, false).unwrap();

        let edges: Vec<_> = graph.active_edges().collect();
        assert_eq!(edges, vec![(TaskId(2), TaskId(3), bc)]);
    }

    #[test]
    fn test_inactive_back_edge_is_stored_without_cycle_check() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        link(&mut graph, &tasks, 2, 1).unwrap();

        let back = graph
            .add_inactive_dependency(&tasks, NewDependency::new(TaskId(1), TaskId(2)))
            .unwrap();
        assert_eq!(graph.dependency_count(), 2);
        assert!(!graph.get(back).unwrap().is_active());
        assert!(graph.direct_prerequisites(TaskId(1)).is_empty());
        assert!(!graph.has_cycles());

        let err = graph.set_active(&tasks, back, true).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
        assert!(!graph.get(back).unwrap().is_active());
    }

    #[test]
    fn test_inactive_insert_keeps_other_checks() {
        let tasks = project_tasks();
        let mut graph = DependencyGraph::new(ProjectId(1));
        link(&mut graph, &tasks, 2, 1).unwrap();

        let inactive = |dependent, prerequisite| NewDependency::new(TaskId(dependent), TaskId(prerequisite));
        assert!(matches!(
            graph.add_inactive_dependency(&tasks, inactive(3, 3)),
            Err(Error::SelfDependency { .. })
        ));
        assert!(matches!(
            graph.add_inactive_dependency(&tasks, inactive(90, 1)),
            Err(Error::CrossProject { .. })
        ));
        assert!(matches!(
            graph.add_inactive_dependency(&tasks, inactive(2, 1)),
            Err(Error::DuplicateDependency { active: true, .. })
        ));
        assert!(matches!(
            graph.add_inactive_dependency(&tasks, inactive(2, 77)),
            Err(Error::TaskNotFound { task: TaskId(77) })
        ));
        assert_eq!(graph.dependency_count(), 1);
    }

    #[test]
    fn test_type_change_to_soft_clears_critical_flag() {
        let tasks = index_tasks([
            TaskSnapshot::new(1, "Design gearbox", 1).with_estimate(4.0),
            TaskSnapshot::new(2, "Order parts", 1).with_estimate(2.0),
            TaskSnapshot::new(3, "Machine plates", 1).with_estimate(6.0),
        ]);
        let config = crate::ScheduleConfig::default();
        let mut graph = DependencyGraph::new(ProjectId(1));
        let first = link(&mut graph, &tasks, 2, 1).unwrap();
        let second = link(&mut graph, &tasks, 3, 2).unwrap();
        graph.update_critical_path_markers(&tasks, &config).unwrap();
        assert_eq!(graph.critical_path_dependencies().len(), 2);

        graph
            .update_dependency(
                &tasks,
                first,
                DependencyUpdate {
                    dependency_type: Some(DependencyType::Soft),
                    ..DependencyUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(graph.update_dependency_types(&[second], DependencyType::Soft), 1);
        assert!(graph.critical_path_dependencies().is_empty());

        graph.update_dependency_types(&[second], DependencyType::StartToStart);
        assert!(!graph.get(second).unwrap().is_critical_path());
    }
}
