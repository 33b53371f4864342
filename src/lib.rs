//! # konverge
//!
//! Cloud infrastructure building blocks for a Kubernetes cluster,
//! expressed as declarative tasks for the [`converge`] engine.
//!
//! Model builders assemble these task types into a [`converge::TaskSet`]
//! and hand the set to [`converge::converge`] together with a target;
//! dependency edges are discovered from the references each task embeds,
//! so builders never declare ordering.

pub mod tasks;

// Re-export the engine types callers need alongside the task library
pub use converge::{
    Cloud, CloudError, CloudFormationTarget, Convergence, ConvergeSummary, DirectApplyTarget,
    DryRunTarget, Error, Fields, FieldsBuilder, Lifecycle, Outcome, Result, RunOptions, Target,
    Task, TaskKey, TaskSet, TerraformTarget, converge, converge_simple,
};
