//! CloudFormation emitter - accumulates a JSON template

use super::{Effect, Target};
use crate::error::Result;
use crate::fields::{self, Fields};
use crate::task::TaskKey;
use crate::types::Outcome;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Emits a JSON template with one resource entry per task key.
///
/// Entries are keyed by task identity in a sorted map and reference values
/// render as `Ref` objects, so serialization is deterministic: two
/// processes converging the same task set emit byte-identical templates.
pub struct CloudFormationTarget {
    path: Option<PathBuf>,
    resources: Mutex<BTreeMap<String, Value>>,
}

impl CloudFormationTarget {
    /// Emit to the given file on finalize
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            resources: Mutex::new(BTreeMap::new()),
        }
    }

    /// Accumulate in memory only; callers read [`Self::document`]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            resources: Mutex::new(BTreeMap::new()),
        }
    }

    /// Serialize the accumulated template
    pub fn document(&self) -> Result<String> {
        let resources = self.resources.lock().unwrap();
        let template = json!({ "Resources": &*resources });
        Ok(serde_json::to_string_pretty(&template)?)
    }

    /// Number of accumulated resource entries
    pub fn resource_count(&self) -> usize {
        self.resources.lock().unwrap().len()
    }
}

fn properties(desired: &Fields) -> Value {
    let resolved = fields::map_document_references(desired, &|key| {
        json!({ "Ref": key.to_string() })
    });
    json!(resolved)
}

impl Target for CloudFormationTarget {
    fn render(&self, key: &TaskKey, effect: &Effect) -> Result<Outcome> {
        let desired = match effect {
            Effect::Create { desired } | Effect::Update { desired, .. } => desired,
            Effect::Unchanged => return Ok(Outcome::Unchanged),
        };
        let entry = json!({
            "Type": key.kind(),
            "Properties": properties(desired),
        });
        self.resources
            .lock()
            .unwrap()
            .insert(key.to_string(), entry);
        Ok(Outcome::Rendered)
    }

    fn finalize(&self) -> Result<()> {
        if let Some(path) = &self.path {
            std::fs::write(path, self.document()?)?;
            log::info!("wrote cloudformation template to {}", path.display());
        }
        Ok(())
    }
}
