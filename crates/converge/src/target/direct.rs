//! Direct-apply target - converges against a live cloud API

use super::{Effect, Target};
use crate::cloud::{Cloud, CloudError};
use crate::diff;
use crate::error::{Error, Result};
use crate::fields::Fields;
use crate::task::TaskKey;
use crate::types::Outcome;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Applies effects by calling the cloud's find/create/update operations.
///
/// Independent convergence runs may act on the same external resource, so
/// a failed create is re-checked against the cloud before being reported:
/// a concurrent actor reaching the same desired state is success, not an
/// error.
pub struct DirectApplyTarget {
    cloud: Arc<dyn Cloud>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DirectApplyTarget {
    pub fn new(cloud: Arc<dyn Cloud>) -> Self {
        Self {
            cloud,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Re-query after a failed create: if the cloud now matches desired
    /// state, a concurrent actor won the race and the task is converged.
    fn absorb_race(&self, key: &TaskKey, desired: &Fields, err: CloudError) -> Result<Outcome> {
        match self.cloud.find(key) {
            Ok(Some(observed)) if diff::compute_changes(&observed, desired).is_empty() => {
                log::info!("{key}: already converged by a concurrent actor");
                Ok(Outcome::Unchanged)
            }
            _ => Err(Error::backend(key.clone(), err)),
        }
    }
}

impl Target for DirectApplyTarget {
    fn observes(&self) -> bool {
        true
    }

    fn cloud(&self) -> Option<Arc<dyn Cloud>> {
        Some(self.cloud.clone())
    }

    fn lock_for(&self, identity: &str) -> Option<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().unwrap();
        Some(locks.entry(identity.to_string()).or_default().clone())
    }

    fn render(&self, key: &TaskKey, effect: &Effect) -> Result<Outcome> {
        match effect {
            Effect::Unchanged => Ok(Outcome::Unchanged),
            Effect::Create { desired } => match self.cloud.create(key, desired) {
                Ok(()) => {
                    log::info!("{key}: created");
                    Ok(Outcome::Created)
                }
                Err(err) if err.is_already_exists() => self.absorb_race(key, desired, err),
                Err(err) => Err(Error::backend(key.clone(), err)),
            },
            Effect::Update { desired, changes } => {
                let changed: Vec<String> =
                    changes.iter().map(|change| change.field.clone()).collect();
                self.cloud
                    .update(key, desired, &changed)
                    .map_err(|err| Error::backend(key.clone(), err))?;
                log::info!("{key}: updated ({})", changed.join(", "));
                Ok(Outcome::Updated)
            }
        }
    }

    fn finalize(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldsBuilder;
    use std::collections::BTreeMap;

    /// Cloud stub whose create always loses the race to a concurrent actor
    struct RacingCloud {
        observed: Fields,
    }

    impl Cloud for RacingCloud {
        fn find(&self, _key: &TaskKey) -> std::result::Result<Option<Fields>, CloudError> {
            Ok(Some(self.observed.clone()))
        }

        fn create(&self, key: &TaskKey, _desired: &Fields) -> std::result::Result<(), CloudError> {
            Err(CloudError::AlreadyExists(key.to_string()))
        }

        fn update(
            &self,
            _key: &TaskKey,
            _desired: &Fields,
            _changed: &[String],
        ) -> std::result::Result<(), CloudError> {
            Ok(())
        }
    }

    /// Cloud stub recording every mutating call
    #[derive(Default)]
    struct RecordingCloud {
        resources: Mutex<BTreeMap<String, Fields>>,
    }

    impl Cloud for RecordingCloud {
        fn find(&self, key: &TaskKey) -> std::result::Result<Option<Fields>, CloudError> {
            Ok(self.resources.lock().unwrap().get(&key.to_string()).cloned())
        }

        fn create(&self, key: &TaskKey, desired: &Fields) -> std::result::Result<(), CloudError> {
            let mut resources = self.resources.lock().unwrap();
            if resources.contains_key(&key.to_string()) {
                return Err(CloudError::AlreadyExists(key.to_string()));
            }
            resources.insert(key.to_string(), desired.clone());
            Ok(())
        }

        fn update(
            &self,
            key: &TaskKey,
            desired: &Fields,
            _changed: &[String],
        ) -> std::result::Result<(), CloudError> {
            self.resources
                .lock()
                .unwrap()
                .insert(key.to_string(), desired.clone());
            Ok(())
        }
    }

    #[test]
    fn test_create_and_update() {
        let cloud = Arc::new(RecordingCloud::default());
        let target = DirectApplyTarget::new(cloud.clone());
        let key = TaskKey::new("Network", "net-1");

        let desired = FieldsBuilder::new().field("cidr", "10.0.0.0/16").build();
        let outcome = target
            .render(
                &key,
                &Effect::Create {
                    desired: desired.clone(),
                },
            )
            .unwrap();
        assert_eq!(outcome, Outcome::Created);

        let wanted = FieldsBuilder::new().field("cidr", "10.1.0.0/16").build();
        let outcome = target
            .render(
                &key,
                &Effect::Update {
                    desired: wanted.clone(),
                    changes: diff::compute_changes(&desired, &wanted),
                },
            )
            .unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(cloud.find(&key).unwrap(), Some(wanted));
    }

    #[test]
    fn test_lost_race_to_identical_state_is_success() {
        let desired = FieldsBuilder::new().field("cidr", "10.0.0.0/16").build();
        let target = DirectApplyTarget::new(Arc::new(RacingCloud {
            observed: desired.clone(),
        }));

        let outcome = target
            .render(
                &TaskKey::new("Network", "net-1"),
                &Effect::Create { desired },
            )
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_lost_race_to_differing_state_is_an_error() {
        let target = DirectApplyTarget::new(Arc::new(RacingCloud {
            observed: FieldsBuilder::new().field("cidr", "192.168.0.0/24").build(),
        }));

        let desired = FieldsBuilder::new().field("cidr", "10.0.0.0/16").build();
        let err = target
            .render(
                &TaskKey::new("Network", "net-1"),
                &Effect::Create { desired },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
    }

    #[test]
    fn test_lock_is_shared_per_identity() {
        let target = DirectApplyTarget::new(Arc::new(RecordingCloud::default()));
        let a = target.lock_for("Subnet/sub-1").unwrap();
        let b = target.lock_for("Subnet/sub-1").unwrap();
        let c = target.lock_for("Subnet/sub-2").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
