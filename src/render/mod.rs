//! Rendered page model and renderer boundary
//!
//! The renderer is an external collaborator: given document content it
//! produces one structured vector graphic per page. Pages are trees of
//! [`VectorNode`]s with ordered attribute maps, so every consumer -
//! bundle codec, diff engine, preview serialization - sees a
//! deterministic shape.

mod bundle;
mod cache;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bundle::{BundleError, PagesBundle};
pub use cache::{CacheStats, RenderArtifacts, RenderCache, DEFAULT_RENDER_CACHE_CAPACITY};

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;

/// Renderer collaborator failures.
///
/// Rendering is best-effort everywhere in this crate: callers downgrade
/// these to content-only results, they never abort a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The renderer rejected the document.
    #[error("document failed to render: {0}")]
    InvalidDocument(String),

    /// The renderer itself failed.
    #[error("renderer failed: {0}")]
    Failed(String),
}

/// One node of a page's vector graphic.
///
/// Attributes are kept in a `BTreeMap` so iteration order, and with it
/// every derived signature and serialization, is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorNode {
    /// Element tag, e.g. `g`, `rect`, `path`, `text`.
    pub tag: String,

    /// Attributes in key order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    /// Text content of text-bearing elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child nodes, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VectorNode>,
}

impl VectorNode {
    /// Creates an empty node with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Sets an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Sets text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Appends a child node.
    pub fn with_child(mut self, child: VectorNode) -> Self {
        self.children.push(child);
        self
    }

    /// Looks up an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// True for nodes with no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Serializes this node to SVG-style markup.
    ///
    /// Used for the stored first-page preview; the output is
    /// deterministic because attributes iterate in key order.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_markup(value));
        }

        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_markup(text));
        }
        for child in &self.children {
            child.write_markup(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// One rendered page of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRendering {
    /// Zero-based page index.
    pub index: usize,

    /// Page label, when the renderer knows one. Reconciled with stored
    /// `page_names` positionally, never by assuming equal length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The page's vector graphic.
    pub graphic: VectorNode,
}

impl PageRendering {
    /// Creates a page rendering.
    pub fn new(index: usize, graphic: VectorNode) -> Self {
        Self {
            index,
            name: None,
            graphic,
        }
    }

    /// Sets the page label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Renderer collaborator boundary.
///
/// Implementations render every internal page of a document. Rendering
/// may suspend (external process, worker) which is why the boundary is
/// async.
pub trait PageRenderer: Send + Sync {
    /// Render all pages of `content`, in page order.
    fn render_all_pages<'a>(
        &'a self,
        content: &'a str,
    ) -> BoxFuture<'a, RenderResult<Vec<PageRendering>>>;
}

/// Applies a version record's stored page labels to a rendering.
///
/// Reconciliation is strictly positional: label i goes to page i.
/// A label list longer than the rendering keeps its tail unused; a
/// shorter one leaves trailing pages with whatever label the renderer
/// gave them. The two lengths are never assumed equal.
pub fn apply_page_names(pages: &mut [PageRendering], names: &[String]) {
    for (page, name) in pages.iter_mut().zip(names.iter()) {
        page.name = Some(name.clone());
    }
}
