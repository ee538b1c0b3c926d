//! Materializer - full-content reconstruction of any stored version
//!
//! A keyframe materializes to its own content. A diff record
//! materializes by walking `source_version_id` back to the nearest
//! keyframe and replaying the stored deltas forward. The walk is
//! bounded: corrupted data (a cycle, a severed chain) surfaces as
//! `ChainTooDeep` or `MissingSource`, never an unbounded loop.
//!
//! Resolution is injected through [`VersionResolver`] so callers choose
//! the lookup mechanism - owner-scoped, cached, or cross-process - and
//! the materializer stays a pure function over what it resolves:
//! repeated calls against an unchanged store return byte-identical
//! content, and nothing here ever mutates a record.

mod diff;
mod errors;

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::store::{StoreResult, VersionRecord, VersionStore};

pub use diff::{ContentDiff, DiffApplyError, DiffOp};
pub use errors::{MaterializeError, MaterializeResult};

/// Upper bound on chain hops during materialization.
///
/// Strictly above anything the snapshot writer's re-keyframing policy
/// can produce, so exceeding it always means corrupted data.
pub const DEFAULT_HOP_LIMIT: u32 = 64;

/// Injected version lookup.
pub trait VersionResolver: Send + Sync {
    /// Resolve a version record by id.
    fn resolve<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<VersionRecord>>;
}

/// Resolver over a [`VersionStore`], scoped to one owner.
///
/// Every ancestor lookup re-enforces the owner boundary, so a chain
/// that crosses owners fails loudly mid-walk.
pub struct OwnerResolver {
    store: Arc<VersionStore>,
    owner_id: String,
}

impl OwnerResolver {
    /// Creates a resolver reading `owner_id`'s versions from `store`.
    pub fn new(store: Arc<VersionStore>, owner_id: impl Into<String>) -> Self {
        Self {
            store,
            owner_id: owner_id.into(),
        }
    }
}

impl VersionResolver for OwnerResolver {
    fn resolve<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<VersionRecord>> {
        Box::pin(self.store.get_version(id, &self.owner_id))
    }
}

/// Reconstructs the full document content of `version`.
pub async fn materialize(
    version: &VersionRecord,
    resolver: &dyn VersionResolver,
) -> MaterializeResult<String> {
    materialize_with_limit(version, resolver, DEFAULT_HOP_LIMIT).await
}

/// Reconstructs content with an explicit hop limit.
pub async fn materialize_with_limit(
    version: &VersionRecord,
    resolver: &dyn VersionResolver,
    hop_limit: u32,
) -> MaterializeResult<String> {
    if version.is_keyframe {
        return Ok(version.content.clone());
    }

    // Walk backward to the keyframe, collecting diff records
    // newest-first.
    let mut diffs: Vec<VersionRecord> = Vec::new();
    let mut current = version.clone();
    let mut hops = 0u32;

    let keyframe = loop {
        if current.is_keyframe {
            break current;
        }

        hops += 1;
        if hops > hop_limit {
            return Err(MaterializeError::ChainTooDeep {
                version_id: version.id.clone(),
                limit: hop_limit,
            });
        }

        let source_id =
            current
                .source_version_id
                .clone()
                .ok_or_else(|| MaterializeError::MissingSource {
                    version_id: current.id.clone(),
                })?;

        let source = resolver.resolve(&source_id).await?;
        diffs.push(current);
        current = source;
    };

    // Replay deltas oldest-first on top of the keyframe content.
    let mut content = keyframe.content;
    for record in diffs.iter().rev() {
        let delta = ContentDiff::decode(&record.content).map_err(|e| {
            MaterializeError::DiffDecode {
                version_id: record.id.clone(),
                detail: e.to_string(),
            }
        })?;
        content = delta
            .apply(&content)
            .map_err(|e| MaterializeError::DiffApply {
                version_id: record.id.clone(),
                detail: e.to_string(),
            })?;
    }

    Ok(content)
}
