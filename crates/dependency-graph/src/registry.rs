//! Shared per-project graphs for concurrent callers.
//!
//! Readers take an `Arc` snapshot and never wait on validation. Writers of one
//! project are serialised; each write runs against a private copy that is
//! published only when it succeeds.

use crate::{DependencyGraph, DependencyId, NewDependency, ProjectId, Result, TaskProvider};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct ProjectSlot {
    writer: Mutex<()>,
    published: RwLock<Arc<DependencyGraph>>,
}

impl ProjectSlot {
    fn new(graph: DependencyGraph) -> Self {
        Self {
            writer: Mutex::new(()),
            published: RwLock::new(Arc::new(graph)),
        }
    }
}

/// Dependency graphs keyed by project.
#[derive(Debug, Default)]
pub struct ProjectGraphs {
    slots: RwLock<HashMap<ProjectId, Arc<ProjectSlot>>>,
}

impl ProjectGraphs {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, project: ProjectId) -> Arc<ProjectSlot> {
        if let Some(slot) = self.slots.read().get(&project) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .entry(project)
                .or_insert_with(|| Arc::new(ProjectSlot::new(DependencyGraph::new(project)))),
        )
    }

    /// Projects with a graph, in id order.
    #[must_use]
    pub fn projects(&self) -> Vec<ProjectId> {
        let mut projects: Vec<ProjectId> = self.slots.read().keys().copied().collect();
        projects.sort_unstable();
        projects
    }

    /// Current graph of a project; empty if none was ever written.
    #[must_use]
    pub fn snapshot(&self, project: ProjectId) -> Arc<DependencyGraph> {
        self.slots.read().get(&project).map_or_else(
            || Arc::new(DependencyGraph::new(project)),
            |slot| Arc::clone(&slot.published.read()),
        )
    }

    /// Replace a project's graph wholesale.
    pub fn publish(&self, graph: DependencyGraph) {
        let slot = self.slot(graph.project());
        let _writer = slot.writer.lock();
        *slot.published.write() = Arc::new(graph);
    }

    /// Apply a change to a project's graph atomically.
    ///
    /// The closure runs on a copy; on error nothing is published.
    ///
    /// # Errors
    ///
    /// Returns whatever the closure returns.
    pub fn modify<T, F>(&self, project: ProjectId, change: F) -> Result<T>
    where
        F: FnOnce(&mut DependencyGraph) -> Result<T>,
    {
        let slot = self.slot(project);
        let _writer = slot.writer.lock();

        let mut graph = DependencyGraph::clone(&slot.published.read());
        let value = change(&mut graph)?;
        *slot.published.write() = Arc::new(graph);

        debug!(project = %project, "Published dependency graph");
        Ok(value)
    }

    /// Validate and insert a dependency into its project's graph.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::add_dependency`].
    pub fn add_dependency<P: TaskProvider>(
        &self,
        tasks: &P,
        project: ProjectId,
        request: NewDependency,
    ) -> Result<DependencyId> {
        self.modify(project, |graph| graph.add_dependency(tasks, request))
    }
}
