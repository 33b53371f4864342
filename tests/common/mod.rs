//! Shared test fixtures: an in-memory cloud stand-in and sample task sets

use converge::{Cloud, CloudError, Fields, TaskKey};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory cloud recording every call, so tests can assert both state
/// and the absence of mutating calls
#[derive(Default)]
pub struct MemCloud {
    resources: Mutex<BTreeMap<String, Fields>>,
    pub finds: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
}

impl MemCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing resource, as if another actor created it earlier
    pub fn seed(&self, key: &TaskKey, fields: Fields) {
        self.resources
            .lock()
            .unwrap()
            .insert(key.to_string(), fields);
    }

    pub fn get(&self, key: &TaskKey) -> Option<Fields> {
        self.resources.lock().unwrap().get(&key.to_string()).cloned()
    }

    pub fn mutating_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
    }
}

impl Cloud for MemCloud {
    fn find(&self, key: &TaskKey) -> Result<Option<Fields>, CloudError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(key))
    }

    fn create(&self, key: &TaskKey, desired: &Fields) -> Result<(), CloudError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
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
    ) -> Result<(), CloudError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut resources = self.resources.lock().unwrap();
        if !resources.contains_key(&key.to_string()) {
            return Err(CloudError::NotFound(key.to_string()));
        }
        resources.insert(key.to_string(), desired.clone());
        Ok(())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
