//! Subscription Layer - per-owner version-list feed
//!
//! Multiple viewers of one document's history share a single cached
//! historical list instead of each querying the store. The feed is an
//! explicitly-owned object with its lifecycle tied to the embedding
//! session, not a process-wide singleton.
//!
//! - `subscribe` delivers the cached list immediately when one exists;
//!   otherwise it triggers one load and delivers the result
//! - `notify_version_created` / `notify_wip_updated` reload the
//!   affected owner only and push to that owner's observers only
//! - a reload triggered by a write completes (including observer
//!   callbacks) before the write's caller sees its result, so observers
//!   always hold a view at least as new as the caller's

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::observability::LogEvent;
use crate::store::{StoreResult, VersionRecord, VersionStore};

/// Observer callback receiving the owner's historical list,
/// latest-first.
pub type VersionListObserver = Arc<dyn Fn(&[VersionRecord]) + Send + Sync>;

/// Handle returned by [`VersionFeed::subscribe`]; pass back to
/// [`VersionFeed::unsubscribe`] to deregister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: String,
    owner_id: String,
}

impl SubscriptionHandle {
    /// The owner this subscription observes.
    #[inline]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

#[derive(Default)]
struct OwnerFeed {
    cached: Option<Vec<VersionRecord>>,
    observers: Vec<(String, VersionListObserver)>,
}

/// Per-owner version-list cache with observer registry.
pub struct VersionFeed {
    store: Arc<VersionStore>,
    owners: RwLock<HashMap<String, OwnerFeed>>,
}

impl VersionFeed {
    /// Creates a feed reading from `store`.
    pub fn new(store: Arc<VersionStore>) -> Self {
        Self {
            store,
            owners: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an observer for one owner's historical list.
    ///
    /// A cached list is delivered before this returns, with no store
    /// round trip. With no cache yet, one load runs and its result is
    /// delivered (to this and any other observers of the owner).
    pub async fn subscribe(
        &self,
        owner_id: &str,
        observer: VersionListObserver,
    ) -> StoreResult<SubscriptionHandle> {
        let handle = SubscriptionHandle {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
        };

        let cached = {
            let mut owners = self.write_owners();
            let feed = owners.entry(owner_id.to_string()).or_default();
            feed.observers
                .push((handle.id.clone(), Arc::clone(&observer)));
            feed.cached.clone()
        };

        match cached {
            Some(list) => observer(&list),
            None => self.reload(owner_id).await?,
        }

        Ok(handle)
    }

    /// Deregisters an observer. Idempotent.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut owners = self.write_owners();
        if let Some(feed) = owners.get_mut(&handle.owner_id) {
            feed.observers.retain(|(id, _)| id != &handle.id);
        }
    }

    /// A version was created for this owner; reload and broadcast.
    pub async fn notify_version_created(&self, owner_id: &str) -> StoreResult<()> {
        self.reload(owner_id).await
    }

    /// The owner's WIP record changed; reload and broadcast.
    pub async fn notify_wip_updated(&self, owner_id: &str) -> StoreResult<()> {
        self.reload(owner_id).await
    }

    /// The cached list for an owner, if one has been loaded.
    pub fn cached(&self, owner_id: &str) -> Option<Vec<VersionRecord>> {
        self.owners
            .read()
            .ok()
            .and_then(|owners| owners.get(owner_id).and_then(|feed| feed.cached.clone()))
    }

    /// Number of registered observers for an owner.
    pub fn observer_count(&self, owner_id: &str) -> usize {
        self.owners
            .read()
            .map(|owners| {
                owners
                    .get(owner_id)
                    .map(|feed| feed.observers.len())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    /// Drops an owner's cache and observers, e.g. when the document
    /// session closes.
    pub fn close_owner(&self, owner_id: &str) {
        self.write_owners().remove(owner_id);
    }

    async fn reload(&self, owner_id: &str) -> StoreResult<()> {
        let list = self.store.list_historical(owner_id).await?;

        LogEvent::new("FEED_REFRESHED")
            .field("owner_id", owner_id)
            .field("versions", list.len())
            .trace();

        // Update the cache and snapshot the observer set under the
        // lock, then call observers outside it: an observer may call
        // back into the feed.
        let observers: Vec<VersionListObserver> = {
            let mut owners = self.write_owners();
            let feed = owners.entry(owner_id.to_string()).or_default();
            feed.cached = Some(list.clone());
            feed.observers
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect()
        };

        for observer in observers {
            observer(&list);
        }
        Ok(())
    }

    fn write_owners(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, OwnerFeed>> {
        // Critical sections never run observer code, so a poisoned
        // guard still holds a consistent map.
        match self.owners.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::store::{MemoryBackend, VersionRecord};

    fn collector() -> (VersionListObserver, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: VersionListObserver = Arc::new(move |list: &[VersionRecord]| {
            let names = list
                .iter()
                .map(|record| record.semantic_version.clone())
                .collect();
            sink.lock().unwrap().push(names);
        });
        (observer, seen)
    }

    async fn seeded_store() -> Arc<VersionStore> {
        let store = Arc::new(VersionStore::new(Arc::new(MemoryBackend::new())));
        store
            .create_version(VersionRecord::keyframe("doc-a", "1.0.0", "a"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_first_subscribe_triggers_load() {
        let feed = VersionFeed::new(seeded_store().await);
        let (observer, seen) = collector();

        feed.subscribe("doc-a", observer).await.unwrap();

        let deliveries = seen.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0], vec!["1.0.0".to_string()]);
        assert!(feed.cached("doc-a").is_some());
    }

    #[tokio::test]
    async fn test_second_subscribe_served_from_cache() {
        let store = seeded_store().await;
        let feed = VersionFeed::new(Arc::clone(&store));

        let (first, _) = collector();
        feed.subscribe("doc-a", first).await.unwrap();

        // Mutate the store behind the feed's back: a cached subscribe
        // must deliver the cached list, not re-query.
        store
            .create_version(VersionRecord::keyframe("doc-a", "1.1.0", "b"))
            .await
            .unwrap();

        let (second, seen) = collector();
        feed.subscribe("doc-a", second).await.unwrap();

        let deliveries = seen.lock().unwrap();
        assert_eq!(deliveries[0], vec!["1.0.0".to_string()]);
    }

    #[tokio::test]
    async fn test_notify_reloads_and_broadcasts() {
        let store = seeded_store().await;
        let feed = VersionFeed::new(Arc::clone(&store));
        let (observer, seen) = collector();
        feed.subscribe("doc-a", observer).await.unwrap();

        store
            .create_version(VersionRecord::keyframe("doc-a", "1.1.0", "b"))
            .await
            .unwrap();
        feed.notify_version_created("doc-a").await.unwrap();

        let deliveries = seen.lock().unwrap();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(
            deliveries[1],
            vec!["1.1.0".to_string(), "1.0.0".to_string()]
        );
    }

    #[tokio::test]
    async fn test_other_owners_unaffected() {
        let store = seeded_store().await;
        store
            .create_version(VersionRecord::keyframe("doc-b", "1.0.0", "x"))
            .await
            .unwrap();
        let feed = VersionFeed::new(Arc::clone(&store));

        let (observer_a, seen_a) = collector();
        let (observer_b, seen_b) = collector();
        feed.subscribe("doc-a", observer_a).await.unwrap();
        feed.subscribe("doc-b", observer_b).await.unwrap();

        feed.notify_version_created("doc-a").await.unwrap();

        assert_eq!(seen_a.lock().unwrap().len(), 2);
        assert_eq!(seen_b.lock().unwrap().len(), 1, "doc-b only saw its subscribe");
    }

    #[tokio::test]
    async fn test_wip_update_excluded_from_list() {
        let store = seeded_store().await;
        let feed = VersionFeed::new(Arc::clone(&store));
        let (observer, seen) = collector();
        feed.subscribe("doc-a", observer).await.unwrap();

        store.upsert_wip("doc-a", "scratch").await.unwrap();
        feed.notify_wip_updated("doc-a").await.unwrap();

        let deliveries = seen.lock().unwrap();
        // Reloaded, but the WIP record itself never appears.
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[1], vec!["1.0.0".to_string()]);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let store = seeded_store().await;
        let feed = VersionFeed::new(Arc::clone(&store));
        let (observer, seen) = collector();
        let handle = feed.subscribe("doc-a", observer).await.unwrap();

        feed.unsubscribe(&handle);
        feed.notify_version_created("doc-a").await.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(feed.observer_count("doc-a"), 0);
    }

    #[tokio::test]
    async fn test_close_owner_tears_down() {
        let feed = VersionFeed::new(seeded_store().await);
        let (observer, _) = collector();
        feed.subscribe("doc-a", observer).await.unwrap();

        feed.close_owner("doc-a");
        assert!(feed.cached("doc-a").is_none());
        assert_eq!(feed.observer_count("doc-a"), 0);
    }
}
