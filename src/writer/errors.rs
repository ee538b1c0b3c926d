//! Snapshot writer error types.

use thiserror::Error;

use crate::materialize::MaterializeError;
use crate::semver::VersionValidationError;
use crate::store::StoreError;

/// Result type for freeze operations.
pub type FreezeResult<T> = Result<T, FreezeError>;

/// Why a freeze failed outright.
///
/// Render failures are not here: rendering is best-effort and
/// downgrades the outcome instead of failing it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FreezeError {
    /// The requested semantic version was rejected.
    #[error(transparent)]
    Validation(#[from] VersionValidationError),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Resolving the base content failed.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}
