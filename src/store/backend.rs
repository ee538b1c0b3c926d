//! Persistence backend boundary
//!
//! The concrete backend is a deployment choice (key-value store,
//! relational store). This crate consumes it only through
//! [`VersionBackend`]: four primitive operations, no policy. Owner
//! enforcement, WIP filtering, ordering, and timeouts all live in
//! [`super::VersionStore`], so every backend gets them for free.
//!
//! Large artifacts travel through `put_large_fields`/`get_large_fields`
//! only, so routine list/materialize traffic never carries them.

use futures_util::future::BoxFuture;

use super::errors::StoreResult;
use super::record::{LargeFields, VersionRecord};

/// Object-safe async persistence boundary.
///
/// Implementations return `Ok(None)` from lookups when a record is
/// absent; turning that into `NotFound` is the store's job. Backends
/// never see owner semantics beyond storing the field.
pub trait VersionBackend: Send + Sync {
    /// Persist a record. Overwrites any record with the same id.
    fn put(&self, record: VersionRecord) -> BoxFuture<'_, StoreResult<()>>;

    /// Fetch a record by id.
    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<VersionRecord>>>;

    /// Fetch every record belonging to an owner, in insertion order.
    fn list_by_owner<'a>(
        &'a self,
        owner_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<VersionRecord>>>;

    /// Attach large artifacts to an existing record.
    fn put_large_fields<'a>(
        &'a self,
        id: &'a str,
        fields: LargeFields,
    ) -> BoxFuture<'a, StoreResult<()>>;

    /// Fetch a record's large artifacts, if any were attached.
    fn get_large_fields<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<LargeFields>>>;
}
