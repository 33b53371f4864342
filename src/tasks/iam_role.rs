//! IAM role task

use converge::{Error, Fields, FieldsBuilder, Lifecycle, Result, Task};
use serde::{Deserialize, Serialize};

/// An identity role assumed by cluster nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamRole {
    pub name: String,
    /// Policy document granted to the role, serialized JSON
    pub policy: String,
    pub lifecycle: Lifecycle,
}

impl IamRole {
    pub fn new(name: impl Into<String>, policy: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: policy.into(),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

impl Task for IamRole {
    fn kind(&self) -> &'static str {
        "IamRole"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    fn fields(&self) -> Fields {
        FieldsBuilder::new()
            .field("name", self.name.clone())
            .field("policy", self.policy.clone())
            .build()
    }

    fn validate(&self) -> Result<()> {
        if self.policy.is_empty() {
            return Err(Error::MissingField {
                key: self.key(),
                field: "policy",
            });
        }
        Ok(())
    }
}
