//! Version record - the central persisted entity
//!
//! A record is either a keyframe (complete document text in `content`)
//! or a diff (serialized delta against `source_version_id`). Non-WIP
//! records are immutable after creation; only the single WIP record per
//! owner is ever overwritten in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::semver::WIP_VERSION;

/// A stored version of a diagram document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Opaque unique identifier (UUID v4).
    pub id: String,

    /// The document/workspace this version belongs to. Isolation
    /// boundary: a record is never resolvable under another owner.
    pub owner_id: String,

    /// `major.minor.patch[.sub]`, or the reserved WIP identifier.
    pub semantic_version: String,

    /// Optional user-facing label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional user-facing description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// True when `content` holds the complete document text; false when
    /// it holds a serialized diff against `source_version_id`.
    pub is_keyframe: bool,

    /// The version this record diffs against. Required iff not a
    /// keyframe; must resolve within the same owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_version_id: Option<String>,

    /// 0 for keyframes, else source depth + 1. Bounds reconstruction
    /// cost.
    pub diff_chain_depth: u32,

    /// Complete document text or serialized `ContentDiff`.
    pub content: String,

    /// Positional page labels. May differ in length from any rendering's
    /// page count; reconciled by index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_names: Option<Vec<String>>,

    /// Creation timestamp, assigned by the store.
    pub created_at: DateTime<Utc>,

    /// Process-monotonic insertion counter; tie-breaker for every
    /// ordering operation.
    pub created_seq: u64,
}

impl VersionRecord {
    /// Creates a keyframe record holding complete document content.
    ///
    /// Timestamps and sequence numbers are zeroed; the store assigns
    /// them at persistence time.
    pub fn keyframe(
        owner_id: impl Into<String>,
        semantic_version: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            semantic_version: semantic_version.into(),
            name: None,
            description: None,
            is_keyframe: true,
            source_version_id: None,
            diff_chain_depth: 0,
            content: content.into(),
            page_names: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            created_seq: 0,
        }
    }

    /// Creates a diff record against `source`.
    pub fn diff_against(
        source: &VersionRecord,
        semantic_version: impl Into<String>,
        encoded_diff: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: source.owner_id.clone(),
            semantic_version: semantic_version.into(),
            name: None,
            description: None,
            is_keyframe: false,
            source_version_id: Some(source.id.clone()),
            diff_chain_depth: source.diff_chain_depth + 1,
            content: encoded_diff.into(),
            page_names: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            created_seq: 0,
        }
    }

    /// Attaches a user label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a user description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches positional page labels.
    pub fn with_page_names(mut self, page_names: Vec<String>) -> Self {
        self.page_names = Some(page_names);
        self
    }

    /// Returns true if this is the owner's work-in-progress record.
    #[inline]
    pub fn is_wip(&self) -> bool {
        self.semantic_version == WIP_VERSION
    }
}

/// Large side artifacts, stored separately from the core record so that
/// list and materialize traffic never transfers them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LargeFields {
    /// Serialized first-page rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,

    /// Checksummed binary bundle of all page renderings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_bundle: Option<Vec<u8>>,
}

impl LargeFields {
    /// Returns true if neither artifact is present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.preview.is_none() && self.pages_bundle.is_none()
    }
}
