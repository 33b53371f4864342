//! Core types for the convergence engine

use serde::{Deserialize, Serialize};

/// Policy constraining what convergence may do when observed state
/// differs from desired state.
///
/// Lifecycle markers only take effect under targets that observe the real
/// world; pure emitters always render from desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Create when absent, update when drifted
    Mutable,
    /// Resource must already exist and match desired state; never mutated
    ExistsAndValidates,
    /// Resource must already exist; drift is logged and tolerated
    ExistsAndWarnIfChanges,
    /// Create when absent; an existing resource must never be mutated
    ExistsAndImmutable,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::Mutable
    }
}

/// Result of applying a single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Already converged
    Unchanged,
    /// Resource was created
    Created,
    /// Resource was updated in place
    Updated,
    /// Desired state was rendered into an emitter document
    Rendered,
    /// Nothing was done, with a reason
    Skipped { reason: String },
}

impl Outcome {
    /// Check if the outcome represents a change to the external world
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Summary of a convergence run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergeSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ConvergeSummary {
    /// Add an outcome to the summary
    pub fn add_outcome(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Rendered => self.rendered += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated
    }

    /// Total number of tasks processed
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.rendered + self.skipped + self.failed
    }

    /// Check if the run was fully successful (no failures)
    pub fn is_converged(&self) -> bool {
        self.failed == 0
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ConvergeSummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.rendered += other.rendered;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Options for a convergence run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Number of parallel workers applying tasks within one wave
    pub jobs: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}
