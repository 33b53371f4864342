//! Plan building - topological wave layering over the dependency graph

use crate::error::{Error, Result};
use crate::resolver::DependencyGraph;
use crate::task::TaskKey;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// An ordered sequence of waves.
///
/// Tasks within a wave share no dependency edges and are safe to run
/// concurrently; every dependency of a wave's members sits in an earlier
/// wave. Built fresh per convergence run, never persisted. Intra-wave
/// ordering carries no guarantee; the runner sorts members before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    waves: Vec<Vec<TaskKey>>,
}

impl Plan {
    /// Layer the dependency graph into waves, Kahn style: wave 0 holds
    /// every task with no dependencies, wave N every task whose
    /// dependencies all sit in waves < N.
    ///
    /// Tasks left over once no further wave can be peeled sit on a cycle;
    /// the error names the tasks actually on cycles, not merely that one
    /// exists.
    pub fn build(graph: &DependencyGraph) -> Result<Self> {
        let g = graph.graph();

        let mut indegree: HashMap<NodeIndex, usize> = g
            .node_indices()
            .map(|node| {
                (
                    node,
                    g.neighbors_directed(node, Direction::Incoming).count(),
                )
            })
            .collect();

        let mut ready: Vec<NodeIndex> = g
            .node_indices()
            .filter(|node| indegree[node] == 0)
            .collect();

        let mut waves = Vec::new();
        let mut remaining = g.node_count();

        while !ready.is_empty() {
            let wave = std::mem::take(&mut ready);
            for &member in &wave {
                for dependent in g.neighbors_directed(member, Direction::Outgoing) {
                    let unsatisfied = indegree
                        .get_mut(&dependent)
                        .expect("dependent node is in the indegree map");
                    *unsatisfied -= 1;
                    if *unsatisfied == 0 {
                        ready.push(dependent);
                    }
                }
            }
            remaining -= wave.len();
            waves.push(wave.into_iter().map(|node| g[node].clone()).collect());
        }

        if remaining > 0 {
            let mut keys: Vec<TaskKey> = tarjan_scc(g)
                .into_iter()
                .filter(|component| component.len() > 1)
                .flatten()
                .map(|node| g[node].clone())
                .collect();
            keys.sort();
            return Err(Error::Cycle { keys });
        }

        log::debug!(
            "planned {} tasks into {} waves",
            graph.task_count(),
            waves.len()
        );
        Ok(Self { waves })
    }

    /// The waves, in execution order
    pub fn waves(&self) -> &[Vec<TaskKey>] {
        &self.waves
    }

    /// Number of waves
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Total number of tasks across all waves
    pub fn task_count(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// Index of the wave containing the given task
    pub fn wave_of(&self, key: &TaskKey) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|member| member == key))
    }
}
