//! Pluggable convergence backends
//!
//! A target turns a task's computed effect into either a real cloud call
//! or an accumulated configuration block. One target is selected per run
//! and never switched mid-run; switching implementations requires no
//! change to task code.

mod cloudformation;
mod direct;
mod dryrun;
mod terraform;

pub use cloudformation::CloudFormationTarget;
pub use direct::DirectApplyTarget;
pub use dryrun::{DryRunTarget, PlannedAction};
pub use terraform::TerraformTarget;

use crate::cloud::Cloud;
use crate::diff::FieldDiff;
use crate::error::Result;
use crate::fields::Fields;
use crate::task::TaskKey;
use crate::types::Outcome;
use std::sync::{Arc, Mutex};

/// What convergence determined must happen to a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Observed state already matches desired state
    Unchanged,
    /// The resource is absent, or the target renders purely from desired
    /// state
    Create { desired: Fields },
    /// The resource exists but named fields have drifted
    Update {
        desired: Fields,
        changes: Vec<FieldDiff>,
    },
}

/// Backend abstraction: one operation per task, plus finalization.
pub trait Target: Send + Sync {
    /// Whether this target compares desired state against observed
    /// reality. Pure emitters return false and always render from desired
    /// state.
    fn observes(&self) -> bool {
        false
    }

    /// Live cloud handle, for targets that talk to one
    fn cloud(&self) -> Option<Arc<dyn Cloud>> {
        None
    }

    /// Lock serializing operations on one external resource identity.
    /// Only meaningful for targets with read-modify-write semantics.
    fn lock_for(&self, _identity: &str) -> Option<Arc<Mutex<()>>> {
        None
    }

    /// Render the task's effect against this backend
    fn render(&self, key: &TaskKey, effect: &Effect) -> Result<Outcome>;

    /// Called once after the last wave succeeds. Emitter output becomes
    /// durable here and not before.
    fn finalize(&self) -> Result<()>;
}
