//! Structural Diff Engine
//!
//! Compares two snapshots' renderings page by page and reports a
//! structured difference instead of an opaque image diff:
//! - pages pair by index; trailing pages on either side compare against
//!   an absent counterpart and produce a warning, never an error
//! - per page, elements are matched (identity key first, then greedy
//!   signature similarity), classified, and counted
//! - `coverage` - matched over all considered elements - is the single
//!   headline similarity score
//! - every page pair gets a combined overlay rendering
//!
//! The engine is a pure, deterministic, read-only consumer: identical
//! inputs always produce the identical report.

mod element;
mod matcher;
mod overlay;

use std::fmt;

use serde::Serialize;

use crate::render::{PageRendering, VectorNode};

pub use element::{extract_elements, GraphicElement};
pub use matcher::{classify_elements, PageClassification, MATCH_THRESHOLD};
pub use overlay::{
    build_overlay, CHANGED_HIGHLIGHT, MATCHED_OPACITY, ONLY_LEFT_HIGHLIGHT, ONLY_RIGHT_HIGHLIGHT,
};

/// Which rendering a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Non-fatal irregularities observed while diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffWarning {
    /// The two renderings have different page counts.
    PageCountMismatch { left: usize, right: usize },

    /// Both sides have a page at this index but the names differ.
    /// Pages stay aligned by index; names are reported, not dropped.
    PageNameMismatch {
        index: usize,
        left: String,
        right: String,
    },

    /// One side has no page at this index.
    MissingPage { index: usize, side: Side },

    /// One side has no renderable data at all. Diffing degrades to
    /// whole-side-missing instead of failing.
    EmptyRendering { side: Side },
}

impl fmt::Display for DiffWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffWarning::PageCountMismatch { left, right } => {
                write!(f, "page count mismatch: left has {}, right has {}", left, right)
            }
            DiffWarning::PageNameMismatch { index, left, right } => {
                write!(
                    f,
                    "page {} is named '{}' on the left and '{}' on the right",
                    index, left, right
                )
            }
            DiffWarning::MissingPage { index, side } => {
                write!(f, "page {} is missing on the {} side", index, side)
            }
            DiffWarning::EmptyRendering { side } => {
                write!(f, "the {} side has no renderable data", side)
            }
        }
    }
}

/// Diff result for one page pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDiff {
    /// Pair index (pages pair by position).
    pub index: usize,
    /// Left page name, when present.
    pub left_name: Option<String>,
    /// Right page name, when present.
    pub right_name: Option<String>,
    /// Elements paired with identical signatures.
    pub matched: usize,
    /// Elements paired with differing signatures.
    pub changed: usize,
    /// Elements present only on the left.
    pub only_a: usize,
    /// Elements present only on the right.
    pub only_b: usize,
    /// matched / considered for this page; 1.0 for an empty pair.
    pub coverage: f64,
    /// Combined annotated rendering of both sides.
    pub overlay: VectorNode,
}

impl PageDiff {
    /// Elements considered on this page.
    pub fn total_considered(&self) -> usize {
        self.matched + self.changed + self.only_a + self.only_b
    }
}

/// Complete diff of two renderings.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffReport {
    /// Per-page results, in page order.
    pub pages: Vec<PageDiff>,
    /// Total matched elements across pages.
    pub matched: usize,
    /// Total changed elements across pages.
    pub changed: usize,
    /// Total left-only elements across pages.
    pub only_a: usize,
    /// Total right-only elements across pages.
    pub only_b: usize,
    /// Headline score: matched over all considered elements.
    pub coverage: f64,
    /// Irregularities observed while diffing.
    pub warnings: Vec<DiffWarning>,
}

impl DiffReport {
    /// Elements considered across all pages.
    pub fn total_considered(&self) -> usize {
        self.matched + self.changed + self.only_a + self.only_b
    }

    /// True when nothing differs anywhere.
    pub fn is_identical(&self) -> bool {
        self.changed == 0 && self.only_a == 0 && self.only_b == 0
    }
}

/// Compares two renderings and produces the structured diff report.
pub fn compare_renderings(left: &[PageRendering], right: &[PageRendering]) -> DiffReport {
    let mut warnings = Vec::new();

    if left.is_empty() && !right.is_empty() {
        warnings.push(DiffWarning::EmptyRendering { side: Side::Left });
    }
    if right.is_empty() && !left.is_empty() {
        warnings.push(DiffWarning::EmptyRendering { side: Side::Right });
    }
    if left.len() != right.len() {
        warnings.push(DiffWarning::PageCountMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut pages = Vec::new();
    let pair_count = left.len().max(right.len());

    for index in 0..pair_count {
        let left_page = left.get(index);
        let right_page = right.get(index);

        match (left_page, right_page) {
            (Some(left_page), Some(right_page)) => {
                if let (Some(left_name), Some(right_name)) =
                    (left_page.name.as_deref(), right_page.name.as_deref())
                {
                    if left_name != right_name {
                        warnings.push(DiffWarning::PageNameMismatch {
                            index,
                            left: left_name.to_string(),
                            right: right_name.to_string(),
                        });
                    }
                }
            }
            (Some(_), None) => warnings.push(DiffWarning::MissingPage {
                index,
                side: Side::Right,
            }),
            (None, Some(_)) => warnings.push(DiffWarning::MissingPage {
                index,
                side: Side::Left,
            }),
            (None, None) => {}
        }

        let left_elements = left_page
            .map(|page| extract_elements(&page.graphic))
            .unwrap_or_default();
        let right_elements = right_page
            .map(|page| extract_elements(&page.graphic))
            .unwrap_or_default();

        let classification = classify_elements(left_elements, right_elements);
        let overlay = build_overlay(&classification);

        pages.push(PageDiff {
            index,
            left_name: left_page.and_then(|page| page.name.clone()),
            right_name: right_page.and_then(|page| page.name.clone()),
            matched: classification.matched.len(),
            changed: classification.changed.len(),
            only_a: classification.only_a.len(),
            only_b: classification.only_b.len(),
            coverage: classification.coverage(),
            overlay,
        });
    }

    let matched = pages.iter().map(|page| page.matched).sum::<usize>();
    let changed = pages.iter().map(|page| page.changed).sum::<usize>();
    let only_a = pages.iter().map(|page| page.only_a).sum::<usize>();
    let only_b = pages.iter().map(|page| page.only_b).sum::<usize>();
    let total = matched + changed + only_a + only_b;
    let coverage = if total == 0 {
        1.0
    } else {
        matched as f64 / total as f64
    };

    DiffReport {
        pages,
        matched,
        changed,
        only_a,
        only_b,
        coverage,
        warnings,
    }
}
