//! Subnet task

use converge::{Error, Fields, FieldsBuilder, Lifecycle, Result, Task, TaskKey};
use serde::{Deserialize, Serialize};

use super::Network;

/// A subnet carved out of a [`Network`]'s address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: String,
    /// Address range in CIDR notation, within the network's range
    pub cidr: String,
    /// The network this subnet belongs to
    pub network: TaskKey,
    /// Availability zone, when the provider requires one
    pub zone: Option<String>,
    pub lifecycle: Lifecycle,
}

impl Subnet {
    pub fn new(name: impl Into<String>, cidr: impl Into<String>, network: &Network) -> Self {
        Self {
            name: name.into(),
            cidr: cidr.into(),
            network: network.key(),
            zone: None,
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

impl Task for Subnet {
    fn kind(&self) -> &'static str {
        "Subnet"
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
            .reference("network", &self.network)
            .optional("zone", self.zone.clone())
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
