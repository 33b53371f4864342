//! Concrete task types for cluster infrastructure
//!
//! Each type is pure data plus the [`converge::Task`] contract: identity,
//! a lifecycle marker, and a field document. References between tasks
//! (a subnet's network, a rule's subnet) are embedded in the document and
//! become dependency edges automatically; nothing here declares ordering.

pub mod firewall_rule;
pub mod iam_role;
pub mod network;
pub mod subnet;

pub use firewall_rule::FirewallRule;
pub use iam_role::IamRole;
pub use network::Network;
pub use subnet::Subnet;
