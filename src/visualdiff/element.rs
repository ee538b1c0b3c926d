//! Graphical element extraction
//!
//! A page's vector tree is flattened into drawable leaf elements, each
//! carrying:
//! - an identity key, when the element has a persistent `id`/`data-id`
//!   attribute (diagram renderers emit these for nodes and edges)
//! - a content signature: shape kind, geometry attributes, text, and
//!   style attributes
//!
//! Identity pairs elements exactly; signatures classify paired elements
//! as unchanged or changed and drive similarity matching for unkeyed
//! elements. Flattening is depth-first, so element order is the
//! document order of the rendering - the tie-breaker every downstream
//! step uses.

use std::collections::BTreeMap;

use crate::render::VectorNode;

/// Tags that draw something and therefore participate in diffing.
const DRAWABLE_TAGS: &[&str] = &[
    "rect", "circle", "ellipse", "line", "polyline", "polygon", "path", "text", "image", "use",
];

/// Attributes that describe an element's geometry.
const GEOMETRY_ATTRS: &[&str] = &[
    "x", "y", "width", "height", "cx", "cy", "r", "rx", "ry", "x1", "y1", "x2", "y2", "points",
    "d", "transform",
];

/// Attributes that describe an element's visual style.
const STYLE_ATTRS: &[&str] = &[
    "fill", "stroke", "stroke-width", "stroke-dasharray", "opacity", "class", "font-size",
    "font-family",
];

/// Attributes carrying a persistent identity, in lookup order.
const IDENTITY_ATTRS: &[&str] = &["id", "data-id"];

/// A drawable element extracted from a page rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicElement {
    /// Position in document order; stable tie-breaker.
    pub order: usize,

    /// Persistent identity key, when the element carries one.
    pub identity: Option<String>,

    /// Shape kind (the tag).
    pub kind: String,

    /// Geometry attributes, in key order.
    pub geometry: BTreeMap<String, String>,

    /// Text content, for text-bearing elements.
    pub text: Option<String>,

    /// Style attributes, in key order.
    pub style: BTreeMap<String, String>,

    /// The original node, kept for overlay rendering.
    pub node: VectorNode,
}

impl GraphicElement {
    /// True when two elements' content signatures are identical.
    pub fn signature_eq(&self, other: &GraphicElement) -> bool {
        self.kind == other.kind
            && self.geometry == other.geometry
            && self.text == other.text
            && self.style == other.style
    }

    /// Content-signature similarity in permille (0..=1000).
    ///
    /// Elements of different kinds never match. Among same-kind
    /// elements the score blends geometry, text, and style agreement on
    /// top of a same-kind base, so a moved-but-identical shape and a
    /// relabeled-but-in-place shape both clear the matching threshold.
    ///
    /// Integer permille rather than a float keeps ordering total and
    /// comparisons exact, which greedy matching needs for determinism.
    pub fn similarity(&self, other: &GraphicElement) -> u32 {
        if self.kind != other.kind {
            return 0;
        }

        let geometry = map_agreement(&self.geometry, &other.geometry);
        let style = map_agreement(&self.style, &other.style);
        let text = match (&self.text, &other.text) {
            (None, None) => 1000,
            (Some(a), Some(b)) if a == b => 1000,
            _ => 0,
        };

        // kind 300 + geometry 400 + text 200 + style 100
        300 + geometry * 400 / 1000 + text * 200 / 1000 + style * 100 / 1000
    }
}

/// Fraction of agreeing entries between two attribute maps, in
/// permille. Two empty maps agree completely.
fn map_agreement(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> u32 {
    let denominator = a.len().max(b.len());
    if denominator == 0 {
        return 1000;
    }

    let agreeing = a
        .iter()
        .filter(|(key, value)| b.get(*key) == Some(value))
        .count();
    (agreeing * 1000 / denominator) as u32
}

/// Flattens a page's vector tree into drawable elements, depth-first.
pub fn extract_elements(root: &VectorNode) -> Vec<GraphicElement> {
    let mut elements = Vec::new();
    collect(root, &mut elements);
    elements
}

fn collect(node: &VectorNode, out: &mut Vec<GraphicElement>) {
    if DRAWABLE_TAGS.contains(&node.tag.as_str()) {
        let identity = IDENTITY_ATTRS
            .iter()
            .find_map(|attr| node.attr(*attr))
            .map(String::from);

        let geometry = filter_attrs(node, GEOMETRY_ATTRS);
        let style = filter_attrs(node, STYLE_ATTRS);

        out.push(GraphicElement {
            order: out.len(),
            identity,
            kind: node.tag.clone(),
            geometry,
            text: node.text.clone(),
            style,
            node: node.clone(),
        });
    }

    for child in &node.children {
        collect(child, out);
    }
}

fn filter_attrs(node: &VectorNode, names: &[&str]) -> BTreeMap<String, String> {
    node.attrs
        .iter()
        .filter(|(key, _)| names.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
