//! # Converge
//!
//! A declarative convergence engine for infrastructure tasks.
//!
//! This crate turns a flat collection of resource descriptions into a
//! dependency-ordered execution plan and applies that plan against a
//! pluggable backend, guaranteeing idempotency: running the same
//! specification twice produces no further changes.
//!
//! ## Core Concepts
//!
//! - **Task**: one named, typed resource description plus a lifecycle marker
//! - **TaskSet**: the flat registry model builders hand to the engine
//! - **DependencyGraph**: edges discovered from references embedded in
//!   each task's field document
//! - **Plan**: topological waves; tasks within a wave run concurrently
//! - **Target**: backend abstraction - direct cloud apply, emitted
//!   configuration, or dry run
//!
//! ## Example
//!
//! ```ignore
//! use converge::{converge_simple, FieldsBuilder, Task, TaskSet, TerraformTarget};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Network {
//!     name: String,
//!     cidr: String,
//! }
//!
//! impl Task for Network {
//!     fn kind(&self) -> &'static str {
//!         "Network"
//!     }
//!
//!     fn name(&self) -> &str {
//!         &self.name
//!     }
//!
//!     fn fields(&self) -> converge::Fields {
//!         FieldsBuilder::new()
//!             .field("name", self.name.clone())
//!             .field("cidr", self.cidr.clone())
//!             .build()
//!     }
//! }
//!
//! let mut tasks = TaskSet::new();
//! tasks.add(Network {
//!     name: "net-1".into(),
//!     cidr: "10.0.0.0/16".into(),
//! })?;
//!
//! let target = Arc::new(TerraformTarget::new("cluster.tf"));
//! let result = converge_simple(&tasks, target)?;
//! assert!(result.summary.is_converged());
//! ```
//!
//! ## Backends
//!
//! One target is selected per run and never switched mid-run:
//!
//! - [`DirectApplyTarget`]: find/create/update against a live [`Cloud`],
//!   with per-resource locking and create-race absorption
//! - [`TerraformTarget`] / [`CloudFormationTarget`]: pure accumulators
//!   emitting one deterministic document per run
//! - [`DryRunTarget`]: records what would happen, touches nothing

pub mod cloud;
pub mod context;
pub mod diff;
pub mod error;
pub mod fields;
pub mod plan;
pub mod resolver;
pub mod runner;
pub mod target;
pub mod task;
pub mod types;

// Re-export main types at crate root
pub use cloud::{Cloud, CloudError};
pub use context::{ExecutionContext, NoProgress, ProgressCallback};
pub use diff::{FieldDiff, compute_changes, render_changes};
pub use error::{Error, Result, TaskFailure};
pub use fields::{Fields, FieldsBuilder};
pub use plan::Plan;
pub use resolver::DependencyGraph;
pub use runner::{Convergence, RunState, converge, converge_simple};
pub use target::{
    CloudFormationTarget, DirectApplyTarget, DryRunTarget, Effect, PlannedAction, Target,
    TerraformTarget,
};
pub use task::{SharedTask, Task, TaskKey, TaskSet};
pub use types::{ConvergeSummary, Lifecycle, Outcome, RunOptions};
