//! Element matching and classification
//!
//! Two passes over a page pair's elements:
//! 1. Identity pass: elements sharing a persistent identity key are
//!    paired outright, each key used at most once per side.
//! 2. Similarity pass: remaining elements are paired greedily by
//!    best content-signature similarity, highest first, ties broken by
//!    original element order, minimum acceptable score 500 permille.
//!
//! Greedy matching is not an optimal bipartite assignment. That is a
//! deliberate trade-off: elements are normally well-identified by
//! persistent keys, so the similarity pass only mops up unkeyed
//! leftovers where near-optimal is good enough and speed matters.
//! A stronger matcher can replace this pass without changing the
//! classification contract.

use std::collections::HashMap;

use super::element::GraphicElement;

/// Minimum similarity (permille) for a similarity-pass pairing.
pub const MATCH_THRESHOLD: u32 = 500;

/// Classified elements of one page pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PageClassification {
    /// Pairs with identical signatures.
    pub matched: Vec<(GraphicElement, GraphicElement)>,
    /// Pairs whose signatures differ.
    pub changed: Vec<(GraphicElement, GraphicElement)>,
    /// Unpaired left elements, in document order.
    pub only_a: Vec<GraphicElement>,
    /// Unpaired right elements, in document order.
    pub only_b: Vec<GraphicElement>,
}

impl PageClassification {
    /// Total elements considered: pairs count once, singles once.
    pub fn total_considered(&self) -> usize {
        self.matched.len() + self.changed.len() + self.only_a.len() + self.only_b.len()
    }

    /// Fraction of considered elements classified matched, in [0, 1].
    /// An empty comparison counts as fully covered.
    pub fn coverage(&self) -> f64 {
        let total = self.total_considered();
        if total == 0 {
            return 1.0;
        }
        self.matched.len() as f64 / total as f64
    }
}

/// Matches and classifies the elements of one page pair.
pub fn classify_elements(
    left: Vec<GraphicElement>,
    right: Vec<GraphicElement>,
) -> PageClassification {
    let mut left_taken = vec![false; left.len()];
    let mut right_taken = vec![false; right.len()];
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    // Identity pass. First occurrence of a key on each side is the
    // keyed one; duplicates fall through to the similarity pass.
    {
        let mut right_by_identity: HashMap<&str, usize> = HashMap::new();
        for (j, element) in right.iter().enumerate() {
            if let Some(identity) = element.identity.as_deref() {
                right_by_identity.entry(identity).or_insert(j);
            }
        }
        for (i, element) in left.iter().enumerate() {
            let Some(identity) = element.identity.as_deref() else {
                continue;
            };
            if let Some(&j) = right_by_identity.get(identity) {
                if !right_taken[j] {
                    left_taken[i] = true;
                    right_taken[j] = true;
                    pairs.push((i, j));
                }
            }
        }
    }

    // Similarity pass over the leftovers: all acceptable candidate
    // pairs, best first, each element used at most once.
    let mut candidates: Vec<(u32, usize, usize)> = Vec::new();
    for (i, left_element) in left.iter().enumerate() {
        if left_taken[i] {
            continue;
        }
        for (j, right_element) in right.iter().enumerate() {
            if right_taken[j] {
                continue;
            }
            let score = left_element.similarity(right_element);
            if score >= MATCH_THRESHOLD {
                candidates.push((score, i, j));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    for (_, i, j) in candidates {
        if !left_taken[i] && !right_taken[j] {
            left_taken[i] = true;
            right_taken[j] = true;
            pairs.push((i, j));
        }
    }

    // Classification. Pair order follows left document order so the
    // report is stable.
    pairs.sort_by_key(|(i, _)| *i);

    let mut classification = PageClassification {
        matched: Vec::new(),
        changed: Vec::new(),
        only_a: Vec::new(),
        only_b: Vec::new(),
    };

    for (i, j) in pairs {
        let pair = (left[i].clone(), right[j].clone());
        if pair.0.signature_eq(&pair.1) {
            classification.matched.push(pair);
        } else {
            classification.changed.push(pair);
        }
    }
    for (i, element) in left.into_iter().enumerate() {
        if !left_taken[i] {
            classification.only_a.push(element);
        }
    }
    for (j, element) in right.into_iter().enumerate() {
        if !right_taken[j] {
            classification.only_b.push(element);
        }
    }

    classification
}
