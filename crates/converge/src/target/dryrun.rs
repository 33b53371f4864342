//! Dry-run target - records what convergence would do
//!
//! Diagnostic only: render records the planned action with a
//! human-readable diff and never calls external systems.

use super::{Effect, Target};
use crate::error::Result;
use crate::task::TaskKey;
use crate::types::Outcome;
use std::fmt;
use std::sync::Mutex;

/// One recorded entry of the dry-run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub key: TaskKey,
    pub effect: Effect,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.effect {
            Effect::Unchanged => write!(f, "{}: unchanged", self.key),
            Effect::Create { desired } => {
                write!(f, "{}: would create", self.key)?;
                for (name, value) in desired {
                    write!(f, "\n  {name} = {value}")?;
                }
                Ok(())
            }
            Effect::Update { changes, .. } => {
                write!(f, "{}: would update", self.key)?;
                for change in changes {
                    write!(f, "\n  {change}")?;
                }
                Ok(())
            }
        }
    }
}

/// Records planned actions without touching any external system
#[derive(Default)]
pub struct DryRunTarget {
    actions: Mutex<Vec<PlannedAction>>,
}

impl DryRunTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded actions, in render order
    pub fn actions(&self) -> Vec<PlannedAction> {
        self.actions.lock().unwrap().clone()
    }

    /// Human-readable report of every recorded action, sorted by task key
    pub fn report(&self) -> String {
        let mut actions = self.actions();
        actions.sort_by(|a, b| a.key.cmp(&b.key));
        actions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Target for DryRunTarget {
    fn render(&self, key: &TaskKey, effect: &Effect) -> Result<Outcome> {
        self.actions.lock().unwrap().push(PlannedAction {
            key: key.clone(),
            effect: effect.clone(),
        });
        Ok(Outcome::Skipped {
            reason: "dry run".to_string(),
        })
    }

    fn finalize(&self) -> Result<()> {
        let actions = self.actions.lock().unwrap();
        let would_act = actions
            .iter()
            .filter(|action| !matches!(action.effect, Effect::Unchanged))
            .count();
        log::info!("dry run: {} of {} tasks would act", would_act, actions.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::FieldDiff;
    use crate::fields::FieldsBuilder;
    use serde_json::json;

    #[test]
    fn test_records_planned_actions() {
        let target = DryRunTarget::new();
        target
            .render(
                &TaskKey::new("Network", "net-1"),
                &Effect::Create {
                    desired: FieldsBuilder::new().field("cidr", "10.0.0.0/16").build(),
                },
            )
            .unwrap();

        let actions = target.actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].key, TaskKey::new("Network", "net-1"));
    }

    #[test]
    fn test_report_renders_diffs() {
        let target = DryRunTarget::new();
        target
            .render(
                &TaskKey::new("Rule", "r-1"),
                &Effect::Update {
                    desired: FieldsBuilder::new().field("port", 443).build(),
                    changes: vec![FieldDiff {
                        field: "port".to_string(),
                        observed: Some(json!(22)),
                        desired: json!(443),
                    }],
                },
            )
            .unwrap();

        let report = target.report();
        assert!(report.contains("Rule/r-1: would update"));
        assert!(report.contains("port: 22 -> 443"));
    }

    #[test]
    fn test_render_reports_skipped() {
        let target = DryRunTarget::new();
        let outcome = target
            .render(
                &TaskKey::new("Network", "net-1"),
                &Effect::Create {
                    desired: FieldsBuilder::new().build(),
                },
            )
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped {
                reason: "dry run".to_string()
            }
        );
    }
}
