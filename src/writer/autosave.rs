//! Debounced WIP autosave
//!
//! Every edit of the working document targets the owner's single WIP
//! record, but one store write per keystroke would be wasteful. The
//! autosave buffer coalesces rapid saves last-write-wins inside a
//! debounce window and writes once per burst.
//!
//! `flush()` writes any coalesced-but-unwritten value immediately;
//! callers must invoke it before teardown or the trailing edit is
//! lost. Dropping the buffer stops the background task but does not
//! flush.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::DEFAULT_AUTOSAVE_DEBOUNCE;
use crate::observability::LogEvent;
use crate::store::{StoreResult, VersionRecord, VersionStore};

struct AutosaveShared {
    pending: Mutex<Option<String>>,
    wakeup: Notify,
}

impl AutosaveShared {
    fn take_pending(&self) -> Option<String> {
        match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// Coalescing last-write-wins buffer for one owner's WIP record.
pub struct WipAutosave {
    store: Arc<VersionStore>,
    owner_id: String,
    shared: Arc<AutosaveShared>,
    task: JoinHandle<()>,
}

impl WipAutosave {
    /// Spawns an autosave buffer with the default debounce window.
    pub fn spawn(store: Arc<VersionStore>, owner_id: impl Into<String>) -> Self {
        Self::spawn_with_debounce(store, owner_id, DEFAULT_AUTOSAVE_DEBOUNCE)
    }

    /// Spawns an autosave buffer with an explicit debounce window.
    pub fn spawn_with_debounce(
        store: Arc<VersionStore>,
        owner_id: impl Into<String>,
        debounce: Duration,
    ) -> Self {
        let owner_id = owner_id.into();
        let shared = Arc::new(AutosaveShared {
            pending: Mutex::new(None),
            wakeup: Notify::new(),
        });

        let task = tokio::spawn(run_flush_loop(
            Arc::clone(&store),
            owner_id.clone(),
            debounce,
            Arc::clone(&shared),
        ));

        Self {
            store,
            owner_id,
            shared,
            task,
        }
    }

    /// Records the latest working-document content. Overwrites any
    /// not-yet-flushed value; the debounced flush writes whatever is
    /// newest when the window closes.
    pub fn save(&self, content: impl Into<String>) {
        if let Ok(mut pending) = self.shared.pending.lock() {
            *pending = Some(content.into());
        }
        self.shared.wakeup.notify_one();
    }

    /// Writes any pending value now, bypassing the debounce window.
    ///
    /// Returns the upserted WIP record, or `None` when nothing was
    /// pending. Must be called before teardown.
    pub async fn flush(&self) -> StoreResult<Option<VersionRecord>> {
        match self.shared.take_pending() {
            Some(content) => {
                let record = self.store.upsert_wip(&self.owner_id, content).await?;
                LogEvent::new("WIP_AUTOSAVE_FLUSHED")
                    .field("owner_id", &self.owner_id)
                    .trace();
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// True when a save is waiting for its debounce window.
    pub fn has_pending(&self) -> bool {
        self.shared
            .pending
            .lock()
            .map(|pending| pending.is_some())
            .unwrap_or(false)
    }

    /// The owner this buffer autosaves for.
    #[inline]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Drop for WipAutosave {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_flush_loop(
    store: Arc<VersionStore>,
    owner_id: String,
    debounce: Duration,
    shared: Arc<AutosaveShared>,
) {
    loop {
        shared.wakeup.notified().await;
        // Let the burst settle; saves landing during the sleep coalesce
        // into this flush.
        tokio::time::sleep(debounce).await;

        let Some(content) = shared.take_pending() else {
            continue;
        };

        match store.upsert_wip(&owner_id, content).await {
            Ok(_) => {
                LogEvent::new("WIP_AUTOSAVE_WRITTEN")
                    .field("owner_id", &owner_id)
                    .trace();
            }
            Err(e) => {
                // The value is gone from the buffer but the next save
                // replaces it anyway; report, don't retry.
                LogEvent::new("WIP_AUTOSAVE_FAILED")
                    .field("owner_id", &owner_id)
                    .field("error", e)
                    .warn();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn store() -> Arc<VersionStore> {
        Arc::new(VersionStore::new(Arc::new(MemoryBackend::new())))
    }

    #[tokio::test]
    async fn test_rapid_saves_coalesce_to_last() {
        let store = store();
        let autosave =
            WipAutosave::spawn_with_debounce(Arc::clone(&store), "doc-1", Duration::from_secs(60));

        autosave.save("draft 1");
        autosave.save("draft 2");
        autosave.save("draft 3");

        // The window has not elapsed; flush writes the newest value.
        let flushed = autosave.flush().await.unwrap().unwrap();
        assert_eq!(flushed.content, "draft 3");

        let wip = store.get_wip("doc-1").await.unwrap().unwrap();
        assert_eq!(wip.content, "draft 3");
    }

    #[tokio::test]
    async fn test_flush_without_pending_is_noop() {
        let autosave = WipAutosave::spawn(store(), "doc-1");
        assert!(autosave.flush().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flush_clears_pending() {
        let autosave =
            WipAutosave::spawn_with_debounce(store(), "doc-1", Duration::from_secs(60));

        autosave.save("draft");
        assert!(autosave.has_pending());

        autosave.flush().await.unwrap();
        assert!(!autosave.has_pending());
        assert!(autosave.flush().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_debounced_write_lands_without_flush() {
        let store = store();
        let autosave = WipAutosave::spawn_with_debounce(
            Arc::clone(&store),
            "doc-1",
            Duration::from_millis(10),
        );

        autosave.save("settled");

        // Poll until the background flush lands.
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if store.get_wip("doc-1").await.unwrap().is_some() {
                break;
            }
        }
        let wip = store.get_wip("doc-1").await.unwrap().unwrap();
        assert_eq!(wip.content, "settled");
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_wip() {
        let store = store();
        let autosave =
            WipAutosave::spawn_with_debounce(Arc::clone(&store), "doc-1", Duration::from_secs(60));

        autosave.save("one");
        autosave.flush().await.unwrap();
        autosave.save("two");
        autosave.flush().await.unwrap();

        let all = store.list_versions("doc-1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "two");
    }
}
