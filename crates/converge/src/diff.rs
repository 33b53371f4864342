//! Field-level diffing between observed and desired state

use crate::fields::Fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single field whose observed value differs from desired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Field name
    pub field: String,
    /// Observed value; `None` when the field is absent from observed state
    pub observed: Option<Value>,
    /// Desired value
    pub desired: Value,
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.observed {
            Some(observed) => write!(f, "{}: {} -> {}", self.field, observed, self.desired),
            None => write!(f, "{}: (unset) -> {}", self.field, self.desired),
        }
    }
}

/// Compare observed state against desired, field by field.
///
/// Only fields present in the desired document participate: observed state
/// routinely carries extra provider-populated attributes the specification
/// does not manage.
pub fn compute_changes(observed: &Fields, desired: &Fields) -> Vec<FieldDiff> {
    desired
        .iter()
        .filter_map(|(name, want)| match observed.get(name) {
            Some(have) if have == want => None,
            have => Some(FieldDiff {
                field: name.clone(),
                observed: have.cloned(),
                desired: want.clone(),
            }),
        })
        .collect()
}

/// Render a list of diffs for human consumption
pub fn render_changes(changes: &[FieldDiff]) -> String {
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
