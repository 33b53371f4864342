//! Task contract and registry
//!
//! A task is the atomic unit of desired state: one named, typed resource
//! description. Tasks never touch the cloud or filesystem directly; every
//! side effect goes through the run's target, which is what keeps behavior
//! consistent across backends.

use crate::context::ExecutionContext;
use crate::diff;
use crate::error::{Error, Result};
use crate::fields::{self, Fields};
use crate::target::Effect;
use crate::types::{Lifecycle, Outcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identity key of a task: `<kind>/<name>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    kind: String,
    name: String,
}

impl TaskKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Parse a `<kind>/<name>` string
    pub fn parse(raw: &str) -> Option<Self> {
        let (kind, name) = raw.split_once('/')?;
        if kind.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(kind, name))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Core trait for declarative resource tasks
///
/// Every resource in the system implements this trait, which provides:
/// - Identity (kind, name)
/// - Desired state as a field document
/// - A lifecycle marker constraining convergence
/// - Dependency discovery through embedded references
///
/// New task types only implement the data methods; the apply flow is
/// provided and identical for every type, so adding a resource kind never
/// touches the engine.
pub trait Task: Send + Sync + fmt::Debug {
    /// Type tag used to build identity keys
    fn kind(&self) -> &'static str;

    /// Unique name within this task's kind
    fn name(&self) -> &str;

    /// Policy applied when observed state differs from desired state
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::default()
    }

    /// Desired state as a field document; references to other tasks are
    /// embedded with [`fields::reference`]
    fn fields(&self) -> Fields;

    /// Validate required fields. Runs during planning, before the
    /// dependency graph is built.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Identity key, `<kind>/<name>`
    fn key(&self) -> TaskKey {
        TaskKey::new(self.kind(), self.name())
    }

    /// Keys of the tasks this one depends on.
    ///
    /// Discovered automatically by walking the field document; override to
    /// declare dependencies that do not appear in any field.
    fn references(&self) -> Vec<TaskKey> {
        fields::document_references(&self.fields())
    }

    /// Identity of the external resource this task operates on.
    ///
    /// Concurrent wave members touching one external resource (several
    /// firewall rules on one subnet) are serialized on this identity, not
    /// per task. Defaults to the task's own key.
    fn resource_identity(&self) -> String {
        self.key().to_string()
    }

    /// Converge this task against the run's target.
    ///
    /// Observes current state if and only if the target compares against
    /// reality, diffs observed against desired, gates the resulting effect
    /// through the lifecycle marker, and delegates the backend effect to
    /// the target.
    fn apply(&self, ctx: &ExecutionContext) -> Result<Outcome> {
        let key = self.key();
        let target = ctx.target();

        let lock = target.lock_for(&self.resource_identity());
        let _guard = lock.as_ref().map(|mutex| mutex.lock().unwrap());

        let effect = if target.observes() {
            let cloud = ctx.cloud().ok_or_else(|| {
                Error::backend(key.clone(), anyhow::anyhow!("target observes but run has no cloud handle"))
            })?;
            // Observed state reports plain names where desired state holds
            // reference nodes; resolve before comparing.
            let desired = fields::map_document_references(&self.fields(), &|referenced| {
                Value::String(referenced.name().to_string())
            });
            let effect = match cloud.find(&key).map_err(|e| Error::backend(key.clone(), e))? {
                None => Effect::Create { desired },
                Some(observed) => {
                    let changes = diff::compute_changes(&observed, &desired);
                    if changes.is_empty() {
                        Effect::Unchanged
                    } else {
                        Effect::Update { desired, changes }
                    }
                }
            };
            gate_lifecycle(&key, self.lifecycle(), effect)?
        } else {
            Effect::Create {
                desired: self.fields(),
            }
        };

        target.render(&key, &effect)
    }
}

/// Apply the lifecycle marker to a computed effect: pass it through, soften
/// it, or refuse with a violation before any mutating call is issued.
fn gate_lifecycle(key: &TaskKey, lifecycle: Lifecycle, effect: Effect) -> Result<Effect> {
    match (lifecycle, effect) {
        (Lifecycle::Mutable, effect) => Ok(effect),
        (_, Effect::Unchanged) => Ok(Effect::Unchanged),
        (Lifecycle::ExistsAndImmutable, Effect::Create { desired }) => {
            Ok(Effect::Create { desired })
        }
        (Lifecycle::ExistsAndImmutable, Effect::Update { changes, .. }) => {
            Err(Error::LifecycleViolation {
                key: key.clone(),
                operation: "update",
                lifecycle,
                fields: changed_fields(&changes),
            })
        }
        (Lifecycle::ExistsAndValidates, Effect::Create { .. }) => Err(Error::LifecycleViolation {
            key: key.clone(),
            operation: "create",
            lifecycle,
            fields: Vec::new(),
        }),
        (Lifecycle::ExistsAndValidates, Effect::Update { changes, .. }) => {
            Err(Error::LifecycleViolation {
                key: key.clone(),
                operation: "update",
                lifecycle,
                fields: changed_fields(&changes),
            })
        }
        (Lifecycle::ExistsAndWarnIfChanges, Effect::Create { .. }) => {
            Err(Error::LifecycleViolation {
                key: key.clone(),
                operation: "create",
                lifecycle,
                fields: Vec::new(),
            })
        }
        (Lifecycle::ExistsAndWarnIfChanges, Effect::Update { changes, .. }) => {
            log::warn!(
                "{key}: observed state differs from desired ({}), leaving as is",
                changed_fields(&changes).join(", ")
            );
            Ok(Effect::Unchanged)
        }
    }
}

fn changed_fields(changes: &[diff::FieldDiff]) -> Vec<String> {
    changes.iter().map(|change| change.field.clone()).collect()
}

/// A boxed task for type-erased storage
pub type SharedTask = Arc<dyn Task>;

/// Registry of tasks keyed by identity, as handed to the engine by model
/// builders. Flat and unordered; execution order is derived by the planner.
#[derive(Default)]
pub struct TaskSet {
    tasks: BTreeMap<TaskKey, SharedTask>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Two tasks sharing one key mean the specification is
    /// internally inconsistent, which is fatal.
    pub fn add(&mut self, task: impl Task + 'static) -> Result<()> {
        self.insert(Arc::new(task))
    }

    /// Register an already-shared task
    pub fn insert(&mut self, task: SharedTask) -> Result<()> {
        if task.name().is_empty() {
            return Err(Error::MissingField {
                key: TaskKey::new(task.kind(), "?"),
                field: "name",
            });
        }
        let key = task.key();
        if self.tasks.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.tasks.insert(key, task);
        Ok(())
    }

    /// Register the task if absent; verify an existing entry is identical.
    ///
    /// Registering a second task under the same key with differing content
    /// is a specification error, not a merge.
    pub fn ensure(&mut self, task: impl Task + 'static) -> Result<()> {
        let key = task.key();
        match self.tasks.get(&key) {
            None => self.insert(Arc::new(task)),
            Some(existing) => {
                if existing.fields() == task.fields()
                    && existing.lifecycle() == task.lifecycle()
                {
                    log::debug!("ensure: identical task {key} already registered");
                    Ok(())
                } else {
                    Err(Error::TaskMismatch(key))
                }
            }
        }
    }

    pub fn get(&self, key: &TaskKey) -> Option<&SharedTask> {
        self.tasks.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.tasks.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskKey, &SharedTask)> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl fmt::Debug for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tasks.keys()).finish()
    }
}
