//! Dependency resolution - derives the task DAG from embedded references
//!
//! Authors never declare edges: every reference a task embeds in its field
//! document contributes one edge. Edges are direct references only (one
//! hop); transitivity is handled by topological layering, not here.

use crate::error::{Error, Result};
use crate::task::{TaskKey, TaskSet};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;

/// The resolved dependency graph for one task set.
///
/// An edge runs from the referenced task to the referencing task, so
/// "A references B" becomes `B -> A`: B must be applied before A.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<TaskKey, ()>,
    index: BTreeMap<TaskKey, NodeIndex>,
}

impl DependencyGraph {
    /// Build the dependency graph for a task set.
    ///
    /// Self references and references to keys absent from the set are
    /// specification errors, detected here, before execution starts.
    pub fn build(tasks: &TaskSet) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();

        for key in tasks.keys() {
            index.insert(key.clone(), graph.add_node(key.clone()));
        }

        for (key, task) in tasks.iter() {
            let from = index[key];
            for referenced in task.references() {
                if referenced == *key {
                    return Err(Error::SelfReference(key.clone()));
                }
                let Some(&to) = index.get(&referenced) else {
                    return Err(Error::DanglingReference {
                        from: key.clone(),
                        to: referenced,
                    });
                };
                // A task may reference the same dependency through several
                // fields; one edge is enough.
                if !graph.contains_edge(to, from) {
                    graph.add_edge(to, from, ());
                }
            }
        }

        log::debug!(
            "resolved {} tasks into {} dependency edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Self { graph, index })
    }

    /// Keys this task depends on
    pub fn dependencies_of(&self, key: &TaskKey) -> Vec<TaskKey> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Keys depending on this task
    pub fn dependents_of(&self, key: &TaskKey) -> Vec<TaskKey> {
        self.neighbors(key, Direction::Outgoing)
    }

    fn neighbors(&self, key: &TaskKey, direction: Direction) -> Vec<TaskKey> {
        let Some(&node) = self.index.get(key) else {
            return Vec::new();
        };
        let mut keys: Vec<TaskKey> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn graph(&self) -> &DiGraph<TaskKey, ()> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Fields, FieldsBuilder};
    use crate::task::Task;
    use serde_json::json;

    #[derive(Debug)]
    struct RefTask {
        kind: &'static str,
        name: String,
        refs: Vec<TaskKey>,
    }

    impl RefTask {
        fn new(kind: &'static str, name: &str, refs: Vec<TaskKey>) -> Self {
            Self {
                kind,
                name: name.to_string(),
                refs,
            }
        }
    }

    impl Task for RefTask {
        fn kind(&self) -> &'static str {
            self.kind
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn fields(&self) -> Fields {
            let refs: Vec<_> = self.refs.iter().map(crate::fields::reference).collect();
            FieldsBuilder::new()
                .field("name", self.name.clone())
                .field("refs", json!(refs))
                .build()
        }
    }

    fn key(kind: &'static str, name: &str) -> TaskKey {
        TaskKey::new(kind, name)
    }

    #[test]
    fn test_edges_follow_references() {
        let mut tasks = TaskSet::new();
        tasks.add(RefTask::new("Network", "net-1", vec![])).unwrap();
        tasks
            .add(RefTask::new("Subnet", "sub-1", vec![key("Network", "net-1")]))
            .unwrap();

        let graph = DependencyGraph::build(&tasks).unwrap();
        assert_eq!(graph.task_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.dependencies_of(&key("Subnet", "sub-1")),
            vec![key("Network", "net-1")]
        );
        assert_eq!(
            graph.dependents_of(&key("Network", "net-1")),
            vec![key("Subnet", "sub-1")]
        );
    }

    #[test]
    fn test_repeated_references_deduplicate() {
        let mut tasks = TaskSet::new();
        tasks.add(RefTask::new("Network", "net-1", vec![])).unwrap();
        tasks
            .add(RefTask::new(
                "Subnet",
                "sub-1",
                vec![key("Network", "net-1"), key("Network", "net-1")],
            ))
            .unwrap();

        let graph = DependencyGraph::build(&tasks).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_dangling_reference_is_fatal() {
        let mut tasks = TaskSet::new();
        tasks
            .add(RefTask::new("Subnet", "sub-1", vec![key("Network", "missing")]))
            .unwrap();

        let err = DependencyGraph::build(&tasks).unwrap_err();
        match err {
            Error::DanglingReference { from, to } => {
                assert_eq!(from, key("Subnet", "sub-1"));
                assert_eq!(to, key("Network", "missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_reference_is_fatal() {
        let mut tasks = TaskSet::new();
        tasks
            .add(RefTask::new("Subnet", "sub-1", vec![key("Subnet", "sub-1")]))
            .unwrap();

        let err = DependencyGraph::build(&tasks).unwrap_err();
        assert!(matches!(err, Error::SelfReference(_)));
        assert!(err.is_specification());
    }
}
