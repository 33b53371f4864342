//! Firewall rule task

use converge::{Error, Fields, FieldsBuilder, Lifecycle, Result, Task, TaskKey};
use serde::{Deserialize, Serialize};

use super::Subnet;

/// An ingress rule attached to a [`Subnet`]
///
/// Several rules routinely target one subnet; their apply steps contend on
/// the subnet's rule table, so the resource identity is the subnet rather
/// than the rule itself and concurrent wave members serialize there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    /// The subnet whose rule table this rule lives in
    pub subnet: TaskKey,
    /// Protocol, e.g. `tcp` or `udp`
    pub protocol: String,
    pub port: u16,
    /// Source ranges allowed by this rule, CIDR notation
    pub sources: Vec<String>,
    pub lifecycle: Lifecycle,
}

impl FirewallRule {
    pub fn new(
        name: impl Into<String>,
        subnet: &Subnet,
        protocol: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            subnet: subnet.key(),
            protocol: protocol.into(),
            port,
            sources: Vec::new(),
            lifecycle: Lifecycle::default(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

impl Task for FirewallRule {
    fn kind(&self) -> &'static str {
        "Rule"
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
            .reference("subnet", &self.subnet)
            .field("protocol", self.protocol.clone())
            .field("port", self.port)
            .field("sources", self.sources.clone())
            .build()
    }

    fn validate(&self) -> Result<()> {
        if self.protocol.is_empty() {
            return Err(Error::MissingField {
                key: self.key(),
                field: "protocol",
            });
        }
        Ok(())
    }

    fn resource_identity(&self) -> String {
        self.subnet.to_string()
    }
}
