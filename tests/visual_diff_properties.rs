//! Structural diff property tests
//!
//! Pins the diff engine's external contract:
//! - self-comparison yields coverage 1.0 and nothing changed
//! - comparison against an empty rendering yields coverage 0.0, every
//!   element side-only, and a missing-side warning
//! - identical inputs always yield the identical report

use sketchvault::render::{PageRendering, VectorNode};
use sketchvault::visualdiff::{compare_renderings, DiffWarning, Side};

/// A small two-page diagram rendering in the shape a renderer emits:
/// keyed nodes and edges plus unkeyed labels.
fn sample_rendering() -> Vec<PageRendering> {
    let page_one = VectorNode::new("g")
        .with_child(
            VectorNode::new("rect")
                .with_attr("id", "node-a")
                .with_attr("x", "20")
                .with_attr("y", "20")
                .with_attr("width", "120")
                .with_attr("height", "40")
                .with_attr("fill", "#eee"),
        )
        .with_child(
            VectorNode::new("rect")
                .with_attr("id", "node-b")
                .with_attr("x", "220")
                .with_attr("y", "20")
                .with_attr("width", "120")
                .with_attr("height", "40")
                .with_attr("fill", "#eee"),
        )
        .with_child(
            VectorNode::new("path")
                .with_attr("id", "edge-a-b")
                .with_attr("d", "M140,40 L220,40")
                .with_attr("stroke", "#333"),
        )
        .with_child(VectorNode::new("text").with_attr("x", "60").with_text("Start"))
        .with_child(VectorNode::new("text").with_attr("x", "260").with_text("End"));

    let page_two = VectorNode::new("g").with_child(
        VectorNode::new("circle")
            .with_attr("id", "legend")
            .with_attr("cx", "30")
            .with_attr("cy", "30")
            .with_attr("r", "10"),
    );

    vec![
        PageRendering::new(0, page_one).with_name("Flow"),
        PageRendering::new(1, page_two).with_name("Legend"),
    ]
}

#[test]
fn test_self_comparison_is_full_coverage() {
    let rendering = sample_rendering();
    let report = compare_renderings(&rendering, &rendering);

    assert_eq!(report.coverage, 1.0);
    assert_eq!(report.changed, 0);
    assert_eq!(report.only_a, 0);
    assert_eq!(report.only_b, 0);
    assert!(report.is_identical());
    assert!(report.warnings.is_empty());
    assert_eq!(report.pages.len(), 2);
}

#[test]
fn test_comparison_against_empty_is_zero_coverage() {
    let rendering = sample_rendering();

    let report = compare_renderings(&rendering, &[]);
    assert_eq!(report.coverage, 0.0);
    assert_eq!(report.matched, 0);
    assert_eq!(report.only_a, 6);
    assert_eq!(report.only_b, 0);
    assert!(report
        .warnings
        .contains(&DiffWarning::EmptyRendering { side: Side::Right }));

    let mirrored = compare_renderings(&[], &rendering);
    assert_eq!(mirrored.coverage, 0.0);
    assert_eq!(mirrored.only_b, 6);
    assert!(mirrored
        .warnings
        .contains(&DiffWarning::EmptyRendering { side: Side::Left }));
}

#[test]
fn test_single_moved_node_is_one_change() {
    let left = sample_rendering();
    let mut right = sample_rendering();
    // Move node-b.
    right[0]
        .graphic
        .children[1]
        .attrs
        .insert("x".to_string(), "400".to_string());

    let report = compare_renderings(&left, &right);
    assert_eq!(report.changed, 1);
    assert_eq!(report.matched, 5);
    assert_eq!(report.only_a, 0);
    assert_eq!(report.only_b, 0);
    assert!((report.coverage - 5.0 / 6.0).abs() < 1e-9);
}

#[test]
fn test_added_and_removed_elements_classify_by_side() {
    let left = sample_rendering();
    let mut right = sample_rendering();
    // Remove the legend circle, add a new node.
    right[1].graphic.children.clear();
    right[0].graphic.children.push(
        VectorNode::new("rect")
            .with_attr("id", "node-c")
            .with_attr("x", "420")
            .with_attr("width", "120"),
    );

    let report = compare_renderings(&left, &right);
    assert_eq!(report.only_a, 1, "legend circle removed from right");
    assert_eq!(report.only_b, 1, "node-c added on right");
    assert_eq!(report.matched, 5);
}

#[test]
fn test_trailing_page_compares_against_absent_side() {
    let left = sample_rendering();
    let right = vec![left[0].clone()];

    let report = compare_renderings(&left, &right);
    assert_eq!(report.pages.len(), 2);
    assert!(report
        .warnings
        .contains(&DiffWarning::PageCountMismatch { left: 2, right: 1 }));
    assert!(report
        .warnings
        .contains(&DiffWarning::MissingPage { index: 1, side: Side::Right }));
    assert_eq!(report.pages[1].only_a, 1);
    assert_eq!(report.pages[1].coverage, 0.0);
}

#[test]
fn test_renamed_page_still_compares_by_index() {
    let left = sample_rendering();
    let mut right = sample_rendering();
    right[0].name = Some("Renamed Flow".to_string());

    let report = compare_renderings(&left, &right);
    assert!(report.warnings.contains(&DiffWarning::PageNameMismatch {
        index: 0,
        left: "Flow".to_string(),
        right: "Renamed Flow".to_string(),
    }));
    // The rename itself is not a content difference.
    assert_eq!(report.coverage, 1.0);
}

#[test]
fn test_report_is_deterministic_across_runs() {
    let left = sample_rendering();
    let mut right = sample_rendering();
    right[0]
        .graphic
        .children
        .push(VectorNode::new("text").with_attr("x", "500").with_text("note"));
    right[0].graphic.children[2]
        .attrs
        .insert("d".to_string(), "M0,0 L10,10".to_string());

    let reports: Vec<_> = (0..5)
        .map(|_| compare_renderings(&left, &right))
        .collect();
    for report in &reports[1..] {
        assert_eq!(report, &reports[0]);
    }
}

#[test]
fn test_overlay_contains_both_sides_geometry() {
    let left = sample_rendering();
    let mut right = sample_rendering();
    right[0].graphic.children[0]
        .attrs
        .insert("x".to_string(), "999".to_string());

    let report = compare_renderings(&left, &right);
    let markup = report.pages[0].overlay.to_markup();

    // Old and new positions of the changed node both render.
    assert!(markup.contains("x=\"20\""));
    assert!(markup.contains("x=\"999\""));
}
