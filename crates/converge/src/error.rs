//! Error types for the convergence engine
//!
//! Specification errors (duplicate keys, dangling references, cycles,
//! missing fields) are detected during planning, before any external
//! effect occurs. Backend errors surface as wave failures; the engine
//! never retries internally, because idempotency makes a caller-level
//! re-invocation safe.

use crate::task::TaskKey;
use crate::types::Lifecycle;
use thiserror::Error;

/// Errors that can occur while planning or executing a convergence run
#[derive(Debug, Error)]
pub enum Error {
    /// Two tasks share one identity key
    #[error("duplicate task key {0}")]
    DuplicateKey(TaskKey),

    /// A task was registered twice with differing content
    #[error("cannot register different task with same key {0}")]
    TaskMismatch(TaskKey),

    /// A task references itself
    #[error("task {0} references itself")]
    SelfReference(TaskKey),

    /// A task references a key absent from the task set
    #[error("task {from} references {to}, which is not in the task set")]
    DanglingReference { from: TaskKey, to: TaskKey },

    /// The reference structure is not a DAG
    #[error("dependency cycle between tasks: {}", format_keys(.keys))]
    Cycle { keys: Vec<TaskKey> },

    /// A required field is unset
    #[error("task {key} is missing required field {field}")]
    MissingField { key: TaskKey, field: &'static str },

    /// The task's lifecycle marker forbids the operation convergence
    /// would require
    #[error("lifecycle {lifecycle:?} forbids {operation} of {key} (fields: {})", format_fields(.fields))]
    LifecycleViolation {
        key: TaskKey,
        operation: &'static str,
        lifecycle: Lifecycle,
        fields: Vec<String>,
    },

    /// The cloud backend call failed
    #[error("backend error applying {key}: {source}")]
    Backend {
        key: TaskKey,
        #[source]
        source: anyhow::Error,
    },

    /// The runner could not build its worker pool
    #[error("failed to create worker pool: {0}")]
    WorkerPool(String),

    /// One or more tasks failed inside a wave
    #[error("wave {wave} failed: {}", format_failures(.failures))]
    WaveFailed {
        wave: usize,
        failures: Vec<TaskFailure>,
    },

    /// IO error (emitter finalization)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (emitter finalization)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A task failure inside a wave, preserved for aggregate reporting
#[derive(Debug)]
pub struct TaskFailure {
    pub key: TaskKey,
    pub error: Error,
}

impl Error {
    /// Planning-time errors: the specification itself is internally
    /// inconsistent. Never retried, reported before any external effect.
    pub fn is_specification(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey(_)
                | Self::TaskMismatch(_)
                | Self::SelfReference(_)
                | Self::DanglingReference { .. }
                | Self::Cycle { .. }
                | Self::MissingField { .. }
        )
    }

    /// Check if this is a lifecycle violation
    pub fn is_lifecycle_violation(&self) -> bool {
        matches!(self, Self::LifecycleViolation { .. })
    }

    /// Wrap a cloud backend failure for the given task
    pub fn backend(key: TaskKey, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            key,
            source: source.into(),
        }
    }
}

fn format_keys(keys: &[TaskKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_fields(fields: &[String]) -> String {
    fields.join(", ")
}

fn format_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.key, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for convergence operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specification_category() {
        let err = Error::DuplicateKey(TaskKey::new("Network", "net-1"));
        assert!(err.is_specification());

        let err = Error::Cycle {
            keys: vec![
                TaskKey::new("Subnet", "sub-1"),
                TaskKey::new("Rule", "r-1"),
            ],
        };
        assert!(err.is_specification());

        let err = Error::backend(TaskKey::new("Network", "net-1"), anyhow::anyhow!("rate limit"));
        assert!(!err.is_specification());
    }

    #[test]
    fn test_cycle_names_tasks() {
        let err = Error::Cycle {
            keys: vec![
                TaskKey::new("Rule", "r-1"),
                TaskKey::new("Subnet", "sub-1"),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("Rule/r-1"));
        assert!(message.contains("Subnet/sub-1"));
    }

    #[test]
    fn test_wave_failure_lists_every_task() {
        let err = Error::WaveFailed {
            wave: 2,
            failures: vec![
                TaskFailure {
                    key: TaskKey::new("Rule", "r-1"),
                    error: Error::backend(TaskKey::new("Rule", "r-1"), anyhow::anyhow!("denied")),
                },
                TaskFailure {
                    key: TaskKey::new("Rule", "r-2"),
                    error: Error::backend(TaskKey::new("Rule", "r-2"), anyhow::anyhow!("denied")),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("wave 2"));
        assert!(message.contains("Rule/r-1"));
        assert!(message.contains("Rule/r-2"));
    }

    #[test]
    fn test_lifecycle_violation_names_fields() {
        let err = Error::LifecycleViolation {
            key: TaskKey::new("Rule", "r-1"),
            operation: "update",
            lifecycle: Lifecycle::ExistsAndImmutable,
            fields: vec!["port".to_string()],
        };
        assert!(err.is_lifecycle_violation());
        let message = err.to_string();
        assert!(message.contains("Rule/r-1"));
        assert!(message.contains("port"));
    }
}
