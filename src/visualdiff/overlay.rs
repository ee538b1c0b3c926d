//! Combined diff rendering
//!
//! One overlay graphic per page pair, layering both sides' geometry:
//! - matched elements: neutral, translucent
//! - changed elements: left side ghosted, right side highlighted amber
//! - left-only elements: highlighted red
//! - right-only elements: highlighted green
//!
//! Groups and elements are emitted in a fixed order (matched, changed,
//! left-only, right-only; document order within each group) so the
//! overlay for a given pair of pages is always the same tree.

use crate::render::VectorNode;

use super::matcher::PageClassification;

/// Opacity applied to matched (and ghosted) geometry.
pub const MATCHED_OPACITY: &str = "0.35";
/// Highlight for changed elements.
pub const CHANGED_HIGHLIGHT: &str = "#d97706";
/// Highlight for elements present only in the left rendering.
pub const ONLY_LEFT_HIGHLIGHT: &str = "#dc2626";
/// Highlight for elements present only in the right rendering.
pub const ONLY_RIGHT_HIGHLIGHT: &str = "#16a34a";

/// Builds the combined overlay for one classified page pair.
pub fn build_overlay(classification: &PageClassification) -> VectorNode {
    let mut matched_group = VectorNode::new("g")
        .with_attr("class", "diff-matched")
        .with_attr("opacity", MATCHED_OPACITY);
    for (_, right) in &classification.matched {
        matched_group = matched_group.with_child(tagged(&right.node, "matched"));
    }

    let mut changed_group = VectorNode::new("g").with_attr("class", "diff-changed");
    for (left, right) in &classification.changed {
        // Ghost of the old shape underneath the highlighted new one.
        let ghost = tagged(&left.node, "changed-from").with_attr("opacity", MATCHED_OPACITY);
        let highlighted = highlight(&right.node, "changed-to", CHANGED_HIGHLIGHT);
        changed_group = changed_group.with_child(ghost).with_child(highlighted);
    }

    let mut only_a_group = VectorNode::new("g").with_attr("class", "diff-only-left");
    for element in &classification.only_a {
        only_a_group =
            only_a_group.with_child(highlight(&element.node, "only-left", ONLY_LEFT_HIGHLIGHT));
    }

    let mut only_b_group = VectorNode::new("g").with_attr("class", "diff-only-right");
    for element in &classification.only_b {
        only_b_group =
            only_b_group.with_child(highlight(&element.node, "only-right", ONLY_RIGHT_HIGHLIGHT));
    }

    VectorNode::new("g")
        .with_attr("class", "diff-overlay")
        .with_child(matched_group)
        .with_child(changed_group)
        .with_child(only_a_group)
        .with_child(only_b_group)
}

fn tagged(node: &VectorNode, class: &str) -> VectorNode {
    node.clone().with_attr("data-diff", class)
}

fn highlight(node: &VectorNode, class: &str, color: &str) -> VectorNode {
    tagged(node, class)
        .with_attr("stroke", color)
        .with_attr("stroke-width", "2")
}
