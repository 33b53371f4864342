//! Virtual network task

use converge::{Error, Fields, FieldsBuilder, Lifecycle, Result, Task};
use serde::{Deserialize, Serialize};

/// A virtual network holding the cluster's address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    /// Address range in CIDR notation, e.g. `10.0.0.0/16`
    pub cidr: String,
    pub lifecycle: Lifecycle,
}

impl Network {
    pub fn new(name: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cidr: cidr.into(),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

impl Task for Network {
    fn kind(&self) -> &'static str {
        "Network"
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
            .field("cidr", self.cidr.clone())
            .build()
    }

    fn validate(&self) -> Result<()> {
        if self.cidr.is_empty() {
            return Err(Error::MissingField {
                key: self.key(),
                field: "cidr",
            });
        }
        Ok(())
    }
}
