//! Cloud backend boundary for the direct-apply target
//!
//! The engine does not define a wire protocol, only find-before-write
//! semantics per resource: implementations dispatch on the task key's kind
//! and translate field documents into provider calls.

use crate::fields::Fields;
use crate::task::TaskKey;
use thiserror::Error;

/// Errors surfaced by a cloud backend.
///
/// Categorized so the direct-apply target can tell a real failure from a
/// concurrent actor winning the same create race.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The resource already exists, possibly created by a concurrent actor
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The resource was not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("permission denied: {0}")]
    Permission(String),

    /// The provider is throttling requests
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Other provider error
    #[error("{0}")]
    Other(String),
}

impl CloudError {
    /// Whether a failed create may actually be a lost race
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Whether the failure is typically transient. The engine never retries
    /// internally; callers may re-invoke `converge` and rely on idempotency.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Find/create/update surface the engine requires of a live cloud
pub trait Cloud: Send + Sync {
    /// Look up the current observed state of a resource by identity.
    /// Returns `None` when the resource does not exist.
    fn find(&self, key: &TaskKey) -> Result<Option<Fields>, CloudError>;

    /// Create the resource with the given desired fields
    fn create(&self, key: &TaskKey, desired: &Fields) -> Result<(), CloudError>;

    /// Update the named fields of an existing resource
    fn update(&self, key: &TaskKey, desired: &Fields, changed: &[String])
    -> Result<(), CloudError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_category() {
        assert!(CloudError::AlreadyExists("vpc-1".into()).is_already_exists());
        assert!(!CloudError::Permission("denied".into()).is_already_exists());
    }

    #[test]
    fn test_transient_category() {
        assert!(CloudError::RateLimited("slow down".into()).is_transient());
        assert!(!CloudError::NotFound("vpc-1".into()).is_transient());
    }
}
