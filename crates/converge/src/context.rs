//! Execution context and progress callbacks
//!
//! The context carries shared apply-time state for one convergence run:
//! the resolved task registry, the selected target, and a handle to the
//! live cloud when the target talks to one. Created once per run; the
//! registry is read-only during execution, and the only mutation path is
//! tasks registering their rendered effect with the target.

use crate::cloud::Cloud;
use crate::error::Result;
use crate::target::Target;
use crate::task::{SharedTask, TaskKey, TaskSet};
use crate::types::Outcome;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared apply-time state for one convergence run
pub struct ExecutionContext {
    registry: BTreeMap<TaskKey, SharedTask>,
    target: Arc<dyn Target>,
    cloud: Option<Arc<dyn Cloud>>,
}

impl ExecutionContext {
    /// Create a context for the given task set and target
    pub fn new(tasks: &TaskSet, target: Arc<dyn Target>) -> Self {
        let registry = tasks
            .iter()
            .map(|(key, task)| (key.clone(), task.clone()))
            .collect();
        let cloud = target.cloud();
        Self {
            registry,
            target,
            cloud,
        }
    }

    /// The run's target
    pub fn target(&self) -> &dyn Target {
        self.target.as_ref()
    }

    /// Live cloud handle, when the target carries one
    pub fn cloud(&self) -> Option<&dyn Cloud> {
        self.cloud.as_deref()
    }

    /// Look up a registered task by key, for cross-referencing during
    /// execution
    pub fn task(&self, key: &TaskKey) -> Option<&SharedTask> {
        self.registry.get(key)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

/// Progress callback for convergence runs
///
/// Implement this trait to receive progress updates. Task completions are
/// reported after each wave finishes rather than mid-flight, so
/// implementations need no internal synchronization.
pub trait ProgressCallback: Send {
    /// Called when a wave starts executing
    fn on_wave_start(&mut self, wave: usize, count: usize);

    /// Called for each task once its wave has completed
    fn on_task_complete(&mut self, key: &TaskKey, result: &Result<Outcome>);

    /// Called when a wave completes
    fn on_wave_complete(&mut self, wave: usize);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_wave_start(&mut self, _wave: usize, _count: usize) {}
    fn on_task_complete(&mut self, _key: &TaskKey, _result: &Result<Outcome>) {}
    fn on_wave_complete(&mut self, _wave: usize) {}
}
