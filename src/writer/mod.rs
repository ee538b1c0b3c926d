//! Snapshot Writer - freezing WIP content as historical versions
//!
//! The writer owns the keyframe-vs-diff policy:
//! - first version for an owner: keyframe
//! - latest historical version already at the chain bound: keyframe
//!   (forced re-keyframe, which is what keeps every chain terminating
//!   within a bounded number of hops)
//! - otherwise: a delta against the latest historical version, one
//!   depth deeper
//!
//! Rendering of the preview and pages bundle is best-effort. A render
//! or attach failure logs a warning, the version persists content-only,
//! and the outcome reports `svg_attached = false`. Only validation,
//! store, and materialization failures fail a freeze.
//!
//! Concurrent freezes for one owner are not serialized here; the
//! embedding UI prevents concurrent "create version" actions per
//! document.

mod autosave;
mod errors;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::materialize::{materialize_with_limit, ContentDiff, OwnerResolver};
use crate::observability::LogEvent;
use crate::render::{PageRenderer, PagesBundle};
use crate::semver;
use crate::store::{LargeFields, StoreResult, VersionRecord, VersionStore};
use crate::subscription::VersionFeed;

pub use autosave::WipAutosave;
pub use errors::{FreezeError, FreezeResult};

/// A request to freeze the current working content as a snapshot.
#[derive(Debug, Clone)]
pub struct FreezeRequest {
    /// The semantic version to assign. Validated against the owner's
    /// existing versions; the WIP identifier is always rejected.
    pub semantic_version: String,

    /// Optional user label.
    pub name: Option<String>,

    /// Optional user description.
    pub description: Option<String>,

    /// In-memory content superseding the stored WIP state. When absent
    /// the stored WIP record is materialized instead.
    pub content: Option<String>,

    /// Positional page labels to store with the version.
    pub page_names: Option<Vec<String>>,
}

impl FreezeRequest {
    /// Creates a request for the given semantic version.
    pub fn new(semantic_version: impl Into<String>) -> Self {
        Self {
            semantic_version: semantic_version.into(),
            name: None,
            description: None,
            content: None,
            page_names: None,
        }
    }

    /// Sets the user label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the user description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Supplies in-memory content that supersedes the stored WIP state.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets positional page labels.
    pub fn with_page_names(mut self, page_names: Vec<String>) -> Self {
        self.page_names = Some(page_names);
        self
    }
}

/// Result of a freeze.
///
/// A freeze that persisted content but failed to attach renderings is
/// a degraded success, reported with `svg_attached = false`.
#[derive(Debug, Clone)]
pub struct FreezeOutcome {
    /// The persisted version record.
    pub version: VersionRecord,

    /// Whether the preview and pages bundle were attached.
    pub svg_attached: bool,
}

/// Freezes WIP content into immutable historical versions.
pub struct SnapshotWriter {
    store: Arc<VersionStore>,
    renderer: Arc<dyn PageRenderer>,
    feed: Option<Arc<VersionFeed>>,
    max_chain_depth: u32,
    materialize_hop_limit: u32,
}

impl SnapshotWriter {
    /// Creates a writer with default policy knobs.
    pub fn new(store: Arc<VersionStore>, renderer: Arc<dyn PageRenderer>) -> Self {
        Self::with_config(store, renderer, &EngineConfig::default())
    }

    /// Creates a writer with explicit policy knobs.
    pub fn with_config(
        store: Arc<VersionStore>,
        renderer: Arc<dyn PageRenderer>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            feed: None,
            max_chain_depth: config.max_chain_depth,
            materialize_hop_limit: config.materialize_hop_limit,
        }
    }

    /// Attaches a version feed to refresh after every freeze.
    pub fn with_feed(mut self, feed: Arc<VersionFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// The chain depth at which the writer re-keyframes.
    #[inline]
    pub fn max_chain_depth(&self) -> u32 {
        self.max_chain_depth
    }

    /// Recommends the next main version for an owner.
    pub async fn recommend_main_version(&self, owner_id: &str) -> StoreResult<String> {
        let existing = self.existing_versions(owner_id).await?;
        Ok(semver::next_main_version(&existing))
    }

    /// Recommends the next sub-version under `parent` for an owner.
    pub async fn recommend_sub_version(
        &self,
        owner_id: &str,
        parent: &str,
    ) -> FreezeResult<String> {
        let existing = self.existing_versions(owner_id).await?;
        Ok(semver::next_sub_version(&existing, parent)?)
    }

    /// Freezes the owner's current working content as `request` says.
    pub async fn freeze(&self, owner_id: &str, request: FreezeRequest) -> FreezeResult<FreezeOutcome> {
        let existing = self.existing_versions(owner_id).await?;
        semver::validate(&request.semantic_version, &existing)?;

        let content = self.base_content(owner_id, request.content.as_deref()).await?;

        let latest = self.store.latest_historical(owner_id).await?;
        let mut record = match &latest {
            None => {
                VersionRecord::keyframe(owner_id, request.semantic_version.as_str(), content.as_str())
            }
            Some(source) if source.diff_chain_depth >= self.max_chain_depth => {
                // Forced re-keyframe; the chain stops growing here.
                VersionRecord::keyframe(owner_id, request.semantic_version.as_str(), content.as_str())
            }
            Some(source) => {
                let resolver = OwnerResolver::new(Arc::clone(&self.store), owner_id);
                let source_content =
                    materialize_with_limit(source, &resolver, self.materialize_hop_limit).await?;
                let delta = ContentDiff::compute(&source_content, &content);
                VersionRecord::diff_against(
                    source,
                    request.semantic_version.as_str(),
                    delta.encode(),
                )
            }
        };

        record.name = request.name;
        record.description = request.description;
        record.page_names = request.page_names;

        let stored = self.store.create_version(record).await?;

        let svg_attached = self.attach_renderings(owner_id, &stored, &content).await;

        // Observers see the new version before the caller's result is
        // final.
        if let Some(feed) = &self.feed {
            feed.notify_version_created(owner_id).await?;
        }

        LogEvent::new("VERSION_FROZEN")
            .field("owner_id", owner_id)
            .field("semantic_version", &stored.semantic_version)
            .field("is_keyframe", stored.is_keyframe)
            .field("diff_chain_depth", stored.diff_chain_depth)
            .field("svg_attached", svg_attached)
            .info();

        Ok(FreezeOutcome {
            version: stored,
            svg_attached,
        })
    }

    async fn existing_versions(&self, owner_id: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .store
            .list_versions(owner_id)
            .await?
            .into_iter()
            .filter(|record| !record.is_wip())
            .map(|record| record.semantic_version)
            .collect())
    }

    async fn base_content(
        &self,
        owner_id: &str,
        override_content: Option<&str>,
    ) -> FreezeResult<String> {
        if let Some(content) = override_content {
            return Ok(content.to_string());
        }

        match self.store.get_wip(owner_id).await? {
            Some(wip) => {
                let resolver = OwnerResolver::new(Arc::clone(&self.store), owner_id);
                Ok(materialize_with_limit(&wip, &resolver, self.materialize_hop_limit).await?)
            }
            None => Ok(String::new()),
        }
    }

    /// Best-effort render-and-attach. Never fails the freeze.
    async fn attach_renderings(
        &self,
        owner_id: &str,
        stored: &VersionRecord,
        content: &str,
    ) -> bool {
        let pages = match self.renderer.render_all_pages(content).await {
            Ok(pages) => pages,
            Err(e) => {
                LogEvent::new("RENDER_FAILED")
                    .field("owner_id", owner_id)
                    .field("version_id", &stored.id)
                    .field("error", e)
                    .warn();
                return false;
            }
        };

        let preview = pages.first().map(|page| page.graphic.to_markup());
        let bundle = PagesBundle::new(pages).encode();
        let fields = LargeFields {
            preview,
            pages_bundle: Some(bundle),
        };

        match self
            .store
            .attach_large_fields(&stored.id, owner_id, fields)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                LogEvent::new("RENDER_ATTACH_FAILED")
                    .field("owner_id", owner_id)
                    .field("version_id", &stored.id)
                    .field("error", e)
                    .warn();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;

    use crate::materialize::{materialize, OwnerResolver};
    use crate::render::{PageRendering, RenderError, RenderResult, VectorNode};
    use crate::semver::VersionValidationError;
    use crate::store::MemoryBackend;

    struct FakeRenderer;

    impl PageRenderer for FakeRenderer {
        fn render_all_pages<'a>(
            &'a self,
            content: &'a str,
        ) -> BoxFuture<'a, RenderResult<Vec<PageRendering>>> {
            Box::pin(async move {
                let graphic = VectorNode::new("g")
                    .with_child(VectorNode::new("text").with_text(content));
                Ok(vec![PageRendering::new(0, graphic).with_name("Page 1")])
            })
        }
    }

    struct BrokenRenderer;

    impl PageRenderer for BrokenRenderer {
        fn render_all_pages<'a>(
            &'a self,
            _content: &'a str,
        ) -> BoxFuture<'a, RenderResult<Vec<PageRendering>>> {
            Box::pin(async { Err(RenderError::Failed("renderer crashed".to_string())) })
        }
    }

    fn writer_over(store: &Arc<VersionStore>) -> SnapshotWriter {
        SnapshotWriter::new(Arc::clone(store), Arc::new(FakeRenderer))
    }

    fn store() -> Arc<VersionStore> {
        Arc::new(VersionStore::new(Arc::new(MemoryBackend::new())))
    }

    // ==================== Policy Tests ====================

    #[tokio::test]
    async fn test_first_freeze_is_keyframe() {
        let store = store();
        let writer = writer_over(&store);

        let outcome = writer
            .freeze("doc-1", FreezeRequest::new("1.0.0").with_content("graph A"))
            .await
            .unwrap();

        assert!(outcome.version.is_keyframe);
        assert_eq!(outcome.version.diff_chain_depth, 0);
        assert!(outcome.svg_attached);
    }

    #[tokio::test]
    async fn test_subsequent_freezes_extend_the_chain() {
        let store = store();
        let writer = writer_over(&store);

        writer
            .freeze("doc-1", FreezeRequest::new("1.0.0").with_content("graph A"))
            .await
            .unwrap();
        let second = writer
            .freeze("doc-1", FreezeRequest::new("1.1.0").with_content("graph A\ngraph B"))
            .await
            .unwrap();
        let third = writer
            .freeze("doc-1", FreezeRequest::new("1.2.0").with_content("graph B"))
            .await
            .unwrap();

        assert!(!second.version.is_keyframe);
        assert_eq!(second.version.diff_chain_depth, 1);
        assert_eq!(third.version.diff_chain_depth, 2);

        // Each step materializes back to exactly what was frozen.
        let resolver = OwnerResolver::new(Arc::clone(&store), "doc-1");
        assert_eq!(
            materialize(&third.version, &resolver).await.unwrap(),
            "graph B"
        );
        assert_eq!(
            materialize(&second.version, &resolver).await.unwrap(),
            "graph A\ngraph B"
        );
    }

    #[tokio::test]
    async fn test_chain_bound_forces_keyframe() {
        let store = store();
        let config = EngineConfig {
            max_chain_depth: 2,
            ..EngineConfig::default()
        };
        let writer = SnapshotWriter::with_config(
            Arc::clone(&store),
            Arc::new(FakeRenderer),
            &config,
        );

        let mut depths = Vec::new();
        for (i, version) in ["1.0.0", "1.1.0", "1.2.0", "1.3.0", "1.4.0"].iter().enumerate() {
            let outcome = writer
                .freeze(
                    "doc-1",
                    FreezeRequest::new(*version).with_content(format!("content {i}")),
                )
                .await
                .unwrap();
            depths.push(outcome.version.diff_chain_depth);
        }

        // keyframe, depth 1, depth 2, forced keyframe, depth 1
        assert_eq!(depths, vec![0, 1, 2, 0, 1]);
    }

    #[tokio::test]
    async fn test_freeze_uses_stored_wip_when_no_override() {
        let store = store();
        store.upsert_wip("doc-1", "wip content").await.unwrap();
        let writer = writer_over(&store);

        let outcome = writer
            .freeze("doc-1", FreezeRequest::new("1.0.0"))
            .await
            .unwrap();
        assert_eq!(outcome.version.content, "wip content");
    }

    #[tokio::test]
    async fn test_override_supersedes_stored_wip() {
        let store = store();
        store.upsert_wip("doc-1", "stale wip").await.unwrap();
        let writer = writer_over(&store);

        let outcome = writer
            .freeze(
                "doc-1",
                FreezeRequest::new("1.0.0").with_content("fresher in-memory copy"),
            )
            .await
            .unwrap();
        assert_eq!(outcome.version.content, "fresher in-memory copy");
    }

    // ==================== Validation Tests ====================

    #[tokio::test]
    async fn test_wip_identifier_is_rejected() {
        let writer = writer_over(&store());

        let err = writer
            .freeze("doc-1", FreezeRequest::new(crate::semver::WIP_VERSION))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FreezeError::Validation(VersionValidationError::Reserved(_))
        ));
    }

    #[tokio::test]
    async fn test_sub_version_requires_frozen_parent() {
        let writer = writer_over(&store());

        let err = writer
            .freeze("doc-1", FreezeRequest::new("1.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FreezeError::Validation(VersionValidationError::ParentMissing(_))
        ));

        writer
            .freeze("doc-1", FreezeRequest::new("1.0.0").with_content("a"))
            .await
            .unwrap();
        let sub = writer
            .freeze("doc-1", FreezeRequest::new("1.0.0.1").with_content("a'"))
            .await
            .unwrap();
        assert_eq!(sub.version.semantic_version, "1.0.0.1");
    }

    // ==================== Best-Effort Rendering Tests ====================

    #[tokio::test]
    async fn test_render_failure_degrades_not_fails() {
        let store = store();
        let writer = SnapshotWriter::new(Arc::clone(&store), Arc::new(BrokenRenderer));

        let outcome = writer
            .freeze("doc-1", FreezeRequest::new("1.0.0").with_content("graph A"))
            .await
            .unwrap();

        assert!(!outcome.svg_attached);
        // The version persisted regardless.
        let fetched = store.get_version(&outcome.version.id, "doc-1").await.unwrap();
        assert_eq!(fetched.content, "graph A");
        let fields = store
            .get_large_fields(&outcome.version.id, "doc-1")
            .await
            .unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_successful_render_attaches_artifacts() {
        let store = store();
        let writer = writer_over(&store);

        let outcome = writer
            .freeze("doc-1", FreezeRequest::new("1.0.0").with_content("graph A"))
            .await
            .unwrap();

        let fields = store
            .get_large_fields(&outcome.version.id, "doc-1")
            .await
            .unwrap();
        assert!(fields.preview.is_some());
        let bundle = PagesBundle::decode(&fields.pages_bundle.unwrap()).unwrap();
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.pages[0].name.as_deref(), Some("Page 1"));
    }

    // ==================== Feed & Metadata Tests ====================

    #[tokio::test]
    async fn test_feed_refreshed_before_freeze_returns() {
        let store = store();
        let feed = Arc::new(VersionFeed::new(Arc::clone(&store)));
        let writer = writer_over(&store).with_feed(Arc::clone(&feed));

        writer
            .freeze("doc-1", FreezeRequest::new("1.0.0").with_content("a"))
            .await
            .unwrap();

        let cached = feed.cached("doc-1").unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].semantic_version, "1.0.0");
    }

    #[tokio::test]
    async fn test_labels_and_page_names_persist() {
        let store = store();
        let writer = writer_over(&store);

        let outcome = writer
            .freeze(
                "doc-1",
                FreezeRequest::new("1.0.0")
                    .with_content("a")
                    .with_name("First")
                    .with_description("initial layout")
                    .with_page_names(vec!["Overview".to_string(), "Detail".to_string()]),
            )
            .await
            .unwrap();

        let fetched = store.get_version(&outcome.version.id, "doc-1").await.unwrap();
        assert_eq!(fetched.name.as_deref(), Some("First"));
        assert_eq!(fetched.description.as_deref(), Some("initial layout"));
        assert_eq!(fetched.page_names.as_ref().map(|names| names.len()), Some(2));
    }

    #[tokio::test]
    async fn test_recommendations() {
        let store = store();
        let writer = writer_over(&store);

        assert_eq!(writer.recommend_main_version("doc-1").await.unwrap(), "1.0.0");

        for (version, content) in [("1.0.0", "a"), ("1.1.0", "b"), ("2.0.0", "c")] {
            writer
                .freeze("doc-1", FreezeRequest::new(version).with_content(content))
                .await
                .unwrap();
        }

        assert_eq!(writer.recommend_main_version("doc-1").await.unwrap(), "2.1.0");
        assert_eq!(
            writer.recommend_sub_version("doc-1", "1.0.0").await.unwrap(),
            "1.0.0.1"
        );
    }
}
