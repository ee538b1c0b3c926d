//! Version store error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors.
///
/// `NotFound` and `TimedOut` are recoverable at the caller's
/// discretion. `CrossOwnerAccess` is security-relevant and must reach
/// the top-level caller unmodified; nothing in this crate catches it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No version with this id exists.
    #[error("version not found: {id}")]
    NotFound {
        /// The requested version id.
        id: String,
    },

    /// A version with this id exists but belongs to a different owner.
    /// Always fails loudly; never substitutes data.
    #[error("version {id} is not visible to owner {owner_id}")]
    CrossOwnerAccess {
        /// The requested version id.
        id: String,
        /// The owner that issued the lookup.
        owner_id: String,
    },

    /// A backend call exceeded its configured bound.
    #[error("store operation timed out after {0:?}")]
    TimedOut(Duration),

    /// The backend reported a failure of its own.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a cross-owner access error.
    pub fn cross_owner(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self::CrossOwnerAccess {
            id: id.into(),
            owner_id: owner_id.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_owner_names_both_sides() {
        let err = StoreError::cross_owner("v-123", "doc-9");
        let display = err.to_string();
        assert!(display.contains("v-123"));
        assert!(display.contains("doc-9"));
    }

    #[test]
    fn test_timeout_reports_bound() {
        let err = StoreError::TimedOut(Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));
    }
}
