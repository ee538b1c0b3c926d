//! In-memory backend
//!
//! Reference implementation of [`VersionBackend`] for embedding and
//! tests. All maps live behind a single `RwLock`; operations complete
//! without suspension but still present the async boundary the trait
//! requires.

use std::collections::HashMap;
use std::sync::RwLock;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::backend::VersionBackend;
use super::errors::{StoreError, StoreResult};
use super::record::{LargeFields, VersionRecord};

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, VersionRecord>,
    large_fields: HashMap<String, LargeFields>,
    /// Insertion order of record ids, for deterministic listing.
    insertion_order: Vec<String>,
}

/// A `VersionBackend` holding everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, across all owners.
    pub fn len(&self) -> usize {
        self.read_state(|state| state.records.len()).unwrap_or(0)
    }

    /// True if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_state<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> StoreResult<T> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::backend("memory backend lock poisoned"))?;
        Ok(f(&state))
    }

    fn write_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> StoreResult<T> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::backend("memory backend lock poisoned"))?;
        Ok(f(&mut state))
    }
}

impl VersionBackend for MemoryBackend {
    fn put(&self, record: VersionRecord) -> BoxFuture<'_, StoreResult<()>> {
        let result = self.write_state(|state| {
            if !state.records.contains_key(&record.id) {
                state.insertion_order.push(record.id.clone());
            }
            state.records.insert(record.id.clone(), record);
        });
        async move { result }.boxed()
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<VersionRecord>>> {
        let result = self.read_state(|state| state.records.get(id).cloned());
        async move { result }.boxed()
    }

    fn list_by_owner<'a>(
        &'a self,
        owner_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<VersionRecord>>> {
        let result = self.read_state(|state| {
            state
                .insertion_order
                .iter()
                .filter_map(|id| state.records.get(id))
                .filter(|record| record.owner_id == owner_id)
                .cloned()
                .collect()
        });
        async move { result }.boxed()
    }

    fn put_large_fields<'a>(
        &'a self,
        id: &'a str,
        fields: LargeFields,
    ) -> BoxFuture<'a, StoreResult<()>> {
        let result = self.write_state(|state| {
            if !state.records.contains_key(id) {
                return Err(StoreError::not_found(id));
            }
            state.large_fields.insert(id.to_string(), fields);
            Ok(())
        });
        async move { result? }.boxed()
    }

    fn get_large_fields<'a>(
        &'a self,
        id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<LargeFields>>> {
        let result = self.read_state(|state| state.large_fields.get(id).cloned());
        async move { result }.boxed()
    }
}
