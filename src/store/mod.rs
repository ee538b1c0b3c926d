//! Version Store - owner-scoped persistence of version records
//!
//! The store is a thin policy layer over a pluggable [`VersionBackend`]:
//! - every read enforces the owner boundary (`NotFound` for an absent
//!   id, `CrossOwnerAccess` for an id held by a different owner)
//! - every backend call runs under the configured timeout and surfaces
//!   `TimedOut` rather than hanging or losing data silently
//! - creation stamps `created_at` plus a process-monotonic
//!   `created_seq` tie-breaker
//! - the single WIP record per owner is upserted in place; historical
//!   records are immutable once written
//!
//! The store owns no algorithmic logic. Materialization, diff policy,
//! and rendering live elsewhere.

mod backend;
mod errors;
mod memory;
mod record;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::semver::WIP_VERSION;

pub use backend::VersionBackend;
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use record::{LargeFields, VersionRecord};

/// Default bound for a single backend call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Owner-scoped version store.
pub struct VersionStore {
    backend: Arc<dyn VersionBackend>,
    timeout: Duration,
    seq: AtomicU64,
}

impl VersionStore {
    /// Creates a store over `backend` with the default timeout.
    pub fn new(backend: Arc<dyn VersionBackend>) -> Self {
        Self::with_timeout(backend, DEFAULT_STORE_TIMEOUT)
    }

    /// Creates a store with a caller-supplied per-call timeout.
    pub fn with_timeout(backend: Arc<dyn VersionBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            seq: AtomicU64::new(1),
        }
    }

    /// The per-call timeout bound.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(&self, fut: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::TimedOut(self.timeout)),
        }
    }

    /// Persists a new historical version.
    ///
    /// Stamps `created_at` and `created_seq`, verifies that a diff
    /// record's source exists under the same owner, and returns the
    /// stamped record.
    pub async fn create_version(&self, mut record: VersionRecord) -> StoreResult<VersionRecord> {
        if !record.is_keyframe {
            let source_id = record
                .source_version_id
                .clone()
                .ok_or_else(|| StoreError::backend("diff record has no source_version_id"))?;
            // The source must resolve within the same owner before the
            // chain grows.
            self.get_version(&source_id, &record.owner_id).await?;
        }

        record.created_at = Utc::now();
        record.created_seq = self.seq.fetch_add(1, Ordering::SeqCst);

        self.bounded(self.backend.put(record.clone())).await?;
        Ok(record)
    }

    /// Fetches a version, enforcing the owner boundary.
    pub async fn get_version(&self, id: &str, owner_id: &str) -> StoreResult<VersionRecord> {
        let record = self
            .bounded(self.backend.get(id))
            .await?
            .ok_or_else(|| StoreError::not_found(id))?;

        if record.owner_id != owner_id {
            return Err(StoreError::cross_owner(id, owner_id));
        }
        Ok(record)
    }

    /// Every record for an owner, including WIP, in insertion order.
    pub async fn list_versions(&self, owner_id: &str) -> StoreResult<Vec<VersionRecord>> {
        self.bounded(self.backend.list_by_owner(owner_id)).await
    }

    /// Historical (non-WIP) records, latest first.
    ///
    /// Ordered by `created_at` descending with `created_seq` as the
    /// tie-breaker, so two records stamped in the same instant still
    /// order by insertion.
    pub async fn list_historical(&self, owner_id: &str) -> StoreResult<Vec<VersionRecord>> {
        let mut records: Vec<VersionRecord> = self
            .list_versions(owner_id)
            .await?
            .into_iter()
            .filter(|record| !record.is_wip())
            .collect();
        records.sort_by(|a, b| {
            (b.created_at, b.created_seq).cmp(&(a.created_at, a.created_seq))
        });
        Ok(records)
    }

    /// The most recent historical record, if any exists.
    pub async fn latest_historical(&self, owner_id: &str) -> StoreResult<Option<VersionRecord>> {
        Ok(self.list_historical(owner_id).await?.into_iter().next())
    }

    /// The owner's WIP record, if one exists.
    pub async fn get_wip(&self, owner_id: &str) -> StoreResult<Option<VersionRecord>> {
        Ok(self
            .list_versions(owner_id)
            .await?
            .into_iter()
            .find(|record| record.is_wip()))
    }

    /// Creates or replaces the owner's single WIP record.
    ///
    /// WIP records are always keyframes: they are short-lived and read
    /// far more often than historical snapshots, so they never join a
    /// diff chain. The record id is stable across upserts.
    pub async fn upsert_wip(
        &self,
        owner_id: &str,
        content: impl Into<String>,
    ) -> StoreResult<VersionRecord> {
        let content = content.into();

        let record = match self.get_wip(owner_id).await? {
            Some(mut existing) => {
                existing.content = content;
                existing.created_at = Utc::now();
                existing.created_seq = self.seq.fetch_add(1, Ordering::SeqCst);
                existing
            }
            None => {
                let mut fresh = VersionRecord::keyframe(owner_id, WIP_VERSION, content);
                fresh.created_at = Utc::now();
                fresh.created_seq = self.seq.fetch_add(1, Ordering::SeqCst);
                fresh
            }
        };

        self.bounded(self.backend.put(record.clone())).await?;
        Ok(record)
    }

    /// Attaches large artifacts to an owner's record.
    pub async fn attach_large_fields(
        &self,
        id: &str,
        owner_id: &str,
        fields: LargeFields,
    ) -> StoreResult<()> {
        // Owner check first; artifacts are as owner-scoped as records.
        self.get_version(id, owner_id).await?;
        self.bounded(self.backend.put_large_fields(id, fields)).await
    }

    /// Fetches a record's large artifacts, enforcing the owner boundary.
    ///
    /// A record with no artifacts attached yields empty fields, not an
    /// error.
    pub async fn get_large_fields(&self, id: &str, owner_id: &str) -> StoreResult<LargeFields> {
        self.get_version(id, owner_id).await?;
        Ok(self
            .bounded(self.backend.get_large_fields(id))
            .await?
            .unwrap_or_default())
    }
}
