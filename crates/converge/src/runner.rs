//! Convergence runner - drives the plan wave by wave
//!
//! Planning failures abort before any external effect. Waves execute
//! strictly in order; members of one wave run on parallel workers, since
//! by construction they share no dependency edges. A failure inside a wave
//! lets in-flight siblings finish, is aggregated with every other failure
//! in that wave, and stops the run; later waves never start. Finalization
//! runs only after the last wave succeeds.

use crate::context::{ExecutionContext, NoProgress, ProgressCallback};
use crate::error::{Error, Result, TaskFailure};
use crate::plan::Plan;
use crate::resolver::DependencyGraph;
use crate::target::Target;
use crate::task::{TaskKey, TaskSet};
use crate::types::{ConvergeSummary, Outcome, RunOptions};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Phase of a convergence run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Planning,
    Executing { wave: usize },
    Finalizing,
    Converged,
    Failed { wave: usize },
}

/// Result of a successful convergence run
#[derive(Debug)]
pub struct Convergence {
    /// Terminal state; always [`RunState::Converged`] when returned in `Ok`
    pub state: RunState,
    /// Outcome counters across all tasks
    pub summary: ConvergeSummary,
    /// Per-task outcomes
    pub outcomes: BTreeMap<TaskKey, Outcome>,
    /// The executed wave plan
    pub waves: Vec<Vec<TaskKey>>,
}

/// Single entry point: plan the task set, execute it wave by wave against
/// the target, finalize the target's accumulated output.
pub fn converge<P: ProgressCallback>(
    tasks: &TaskSet,
    target: Arc<dyn Target>,
    opts: &RunOptions,
    progress: &mut P,
) -> Result<Convergence> {
    log::debug!("run state: {:?}", RunState::Planning);
    for (_, task) in tasks.iter() {
        task.validate()?;
    }
    let graph = DependencyGraph::build(tasks)?;
    let plan = Plan::build(&graph)?;
    let ctx = ExecutionContext::new(tasks, target.clone());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))?;

    let mut summary = ConvergeSummary::default();
    let mut outcomes = BTreeMap::new();

    for (wave_index, wave) in plan.waves().iter().enumerate() {
        log::debug!("run state: {:?}", RunState::Executing { wave: wave_index });

        // The builder guarantees nothing about intra-wave order; sort here
        // so reports and emitted documents are stable.
        let mut members: Vec<&TaskKey> = wave.iter().collect();
        members.sort();
        progress.on_wave_start(wave_index, members.len());

        let results: Vec<(TaskKey, Result<Outcome>)> = pool.install(|| {
            members
                .par_iter()
                .map(|key| {
                    let task = ctx
                        .task(key)
                        .expect("planned task is in the execution registry");
                    ((*key).clone(), task.apply(&ctx))
                })
                .collect()
        });

        let mut failures = Vec::new();
        for (key, result) in results {
            progress.on_task_complete(&key, &result);
            match result {
                Ok(outcome) => {
                    summary.add_outcome(&outcome);
                    outcomes.insert(key, outcome);
                }
                Err(error) => {
                    summary.failed += 1;
                    failures.push(TaskFailure { key, error });
                }
            }
        }
        progress.on_wave_complete(wave_index);

        if !failures.is_empty() {
            log::debug!("run state: {:?}", RunState::Failed { wave: wave_index });
            return Err(Error::WaveFailed {
                wave: wave_index,
                failures,
            });
        }
    }

    log::debug!("run state: {:?}", RunState::Finalizing);
    target.finalize()?;
    log::debug!("run state: {:?}", RunState::Converged);

    Ok(Convergence {
        state: RunState::Converged,
        summary,
        outcomes,
        waves: plan.waves().to_vec(),
    })
}

/// Convergence without progress reporting
pub fn converge_simple(tasks: &TaskSet, target: Arc<dyn Target>) -> Result<Convergence> {
    converge(tasks, target, &RunOptions::default(), &mut NoProgress)
}
