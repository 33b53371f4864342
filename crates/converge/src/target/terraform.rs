//! Terraform emitter - accumulates resource blocks into one synthesized
//! configuration document

use super::{Effect, Target};
use crate::error::Result;
use crate::fields::{self, Fields};
use crate::task::TaskKey;
use crate::types::Outcome;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

/// Emits an HCL-style configuration with one resource block per task key.
///
/// Accumulation is in-memory; the document is only written during
/// `finalize`, so a failed run leaves no partial file behind. Blocks are
/// keyed and sorted by task identity and reference values render as
/// interpolations, which makes the output byte-identical for a given task
/// set regardless of insertion or execution order.
pub struct TerraformTarget {
    path: Option<PathBuf>,
    blocks: Mutex<BTreeMap<TaskKey, Fields>>,
}

impl TerraformTarget {
    /// Emit to the given file on finalize
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            blocks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Accumulate in memory only; callers read [`Self::document`]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            blocks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Serialize the accumulated blocks
    pub fn document(&self) -> String {
        let blocks = self.blocks.lock().unwrap();
        let mut out = String::new();
        for (key, fields) in blocks.iter() {
            let _ = writeln!(out, "resource \"{}\" \"{}\" {{", key.kind(), key.name());
            for (name, value) in fields {
                let _ = writeln!(out, "  {name} = {}", render_value(value));
            }
            out.push_str("}\n\n");
        }
        out
    }

    /// Number of accumulated blocks
    pub fn block_count(&self) -> usize {
        self.blocks.lock().unwrap().len()
    }
}

/// Render a field value in HCL-style notation. References become
/// interpolations of the referenced resource's id.
fn render_value(value: &Value) -> String {
    if let Some(key) = fields::as_reference(value) {
        return format!("\"${{{}.{}.id}}\"", key.kind(), key.name());
    }
    match value {
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(name, nested)| format!("{name} = {}", render_value(nested)))
                .collect();
            format!("{{ {} }}", rendered.join(", "))
        }
        scalar => scalar.to_string(),
    }
}

impl Target for TerraformTarget {
    fn render(&self, key: &TaskKey, effect: &Effect) -> Result<Outcome> {
        let desired = match effect {
            Effect::Create { desired } | Effect::Update { desired, .. } => desired.clone(),
            Effect::Unchanged => return Ok(Outcome::Unchanged),
        };
        self.blocks.lock().unwrap().insert(key.clone(), desired);
        Ok(Outcome::Rendered)
    }

    fn finalize(&self) -> Result<()> {
        if let Some(path) = &self.path {
            std::fs::write(path, self.document())?;
            log::info!("wrote terraform configuration to {}", path.display());
        }
        Ok(())
    }
}
