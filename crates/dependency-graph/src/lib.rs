//! Task dependency graph and critical-path scheduling for frcpm.
//!
//! This crate validates "depends on" relationships between the tasks of a
//! build-season project, keeps them in a petgraph-backed store and runs
//! critical-path and risk analysis over them.
//!
//! # Key Types
//!
//! - [`DependencyType`]: The six precedence kinds and their constant policy
//! - [`TaskDependency`]: One edge with satisfaction, blocking and lag rules
//! - [`DependencyGraph`]: Per-project store that rejects self, cross-project,
//!   duplicate and cyclic edges before writing
//! - [`ProjectGraphs`]: Snapshot-read, serialised-write registry of graphs
//! - [`ScheduleTask`] / [`TaskProvider`]: The read-only task contract
//!
//! # Example
//!
//! ```
//! use frcpm_dependency_graph::{
//!     DependencyGraph, NewDependency, ProjectId, ScheduleConfig, TaskId, TaskSnapshot,
//!     index_tasks,
//! };
//!
//! let tasks = index_tasks([
//!     TaskSnapshot::new(1, "CAD drivetrain", 7).with_estimate(8.0),
//!     TaskSnapshot::new(2, "Machine plates", 7).with_estimate(16.0),
//! ]);
//!
//! let mut graph = DependencyGraph::new(ProjectId(7));
//! graph.add_dependency(&tasks, NewDependency::new(TaskId(2), TaskId(1)).lag_hours(4))?;
//!
//! // the reverse edge would close a cycle
//! assert!(graph.add_dependency(&tasks, NewDependency::new(TaskId(1), TaskId(2))).is_err());
//!
//! let analysis = graph.critical_path(&tasks, &ScheduleConfig::default())?;
//! assert_eq!(analysis.critical_path, vec![TaskId(1), TaskId(2)]);
//! # Ok::<(), frcpm_dependency_graph::Error>(())
//! ```

mod analysis;
mod config;
mod critical_path;
mod dependency;
mod dependency_type;
mod error;
mod graph;
mod registry;
mod task;
mod traversal;
mod validation;

pub use analysis::{RiskAssessment, RiskLevel, RiskMetrics, ScheduleRecommendations};
pub use config::ScheduleConfig;
pub use critical_path::{CriticalPathAnalysis, TaskSchedule, WeightedChain};
pub use dependency::{DependencyId, DependencyUpdate, NewDependency, TaskDependency};
pub use dependency_type::{DependencyPolicy, DependencyType};
pub use error::{Error, Result};
pub use graph::{BulkOutcome, DependencyGraph};
pub use registry::ProjectGraphs;
pub use task::{ProjectId, ScheduleTask, TaskId, TaskProvider, TaskSnapshot, index_tasks};
pub use traversal::{
    TopologicalOrder, compute_transitive_closure, find_dependency_path, has_transitive_dependency,
};
pub use validation::ValidationResult;
