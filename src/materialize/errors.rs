//! Materialization error types.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for materialization.
pub type MaterializeResult<T> = Result<T, MaterializeError>;

/// Materialization failures.
///
/// Everything except `Store` indicates corrupted chain data. None of
/// these are ever caught and worked around inside the crate; they
/// propagate to the top-level caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterializeError {
    /// The chain walk exceeded the hop limit without reaching a
    /// keyframe. The writer's re-keyframing policy keeps real chains
    /// far below this, so hitting it means corrupted or cyclic data.
    #[error("diff chain from version {version_id} exceeds {limit} hops without a keyframe")]
    ChainTooDeep {
        /// The version whose materialization was requested.
        version_id: String,
        /// The hop limit that was exceeded.
        limit: u32,
    },

    /// A non-keyframe record carries no source version id.
    #[error("version {version_id} is a diff but has no source version")]
    MissingSource {
        /// The malformed record.
        version_id: String,
    },

    /// A stored delta failed to parse.
    #[error("version {version_id} holds an undecodable delta: {detail}")]
    DiffDecode {
        /// The record holding the delta.
        version_id: String,
        /// Decoder detail.
        detail: String,
    },

    /// A stored delta did not fit the content it was replayed onto.
    #[error("delta of version {version_id} does not apply to its source content: {detail}")]
    DiffApply {
        /// The record holding the delta.
        version_id: String,
        /// Apply failure detail.
        detail: String,
    },

    /// Resolution of a chain ancestor failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_too_deep_names_version_and_limit() {
        let err = MaterializeError::ChainTooDeep {
            version_id: "v-1".to_string(),
            limit: 64,
        };
        let display = err.to_string();
        assert!(display.contains("v-1"));
        assert!(display.contains("64"));
    }

    #[test]
    fn test_store_errors_pass_through() {
        let err: MaterializeError = StoreError::not_found("v-2").into();
        assert!(err.to_string().contains("v-2"));
    }
}
