//! Semantic version validation errors.

use thiserror::Error;

/// Result type for version validation.
pub type ValidationResult<T> = Result<T, VersionValidationError>;

/// Why a candidate version string was rejected.
///
/// Every variant is recoverable: the caller corrects the input and
/// retries. Nothing here is ever downgraded to a generic failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionValidationError {
    /// The candidate was empty or all whitespace.
    #[error("version must not be empty")]
    Empty,

    /// The candidate does not match `major.minor.patch` or
    /// `major.minor.patch.sub`.
    #[error("invalid version format: '{0}' (expected major.minor.patch or major.minor.patch.sub)")]
    FormatInvalid(String),

    /// The candidate equals the reserved work-in-progress identifier.
    #[error("'{0}' is reserved for the work-in-progress version")]
    Reserved(String),

    /// A sub-version's fourth component is outside [1, 999].
    #[error("sub-version {0} is out of range (must be 1..=999)")]
    SubOutOfRange(u32),

    /// A sub-version names a `major.minor.patch` parent that does not
    /// exist in the owner's version set.
    #[error("parent version '{0}' does not exist")]
    ParentMissing(String),
}
