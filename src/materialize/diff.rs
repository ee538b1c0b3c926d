//! Line-based content delta
//!
//! A `ContentDiff` records how to turn one document text into another:
//! keep a run of lines, drop a run of lines, insert new lines. Deltas
//! are computed by trimming the common prefix and suffix and replacing
//! the single middle region. That is deliberately not a minimal diff;
//! it is exact on round-trip, cheap to compute, and fully deterministic,
//! which is what chain storage needs. Lines are split on `\n` only, so
//! apply(compute(a, b), a) == b byte for byte.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a delta failed to apply to a base text.
///
/// Either means the delta was applied to a text it was not computed
/// against - a data-integrity failure, never worked around.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffApplyError {
    /// An op consumed more base lines than exist.
    #[error("delta consumes {wanted} lines at offset {offset}, base has {available}")]
    BaseTooShort {
        offset: usize,
        wanted: usize,
        available: usize,
    },

    /// The delta finished without consuming the whole base.
    #[error("delta left {unconsumed} base lines unconsumed")]
    TrailingBase { unconsumed: usize },
}

/// One step of a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DiffOp {
    /// Copy the next `lines` lines of the base unchanged.
    Keep { lines: usize },
    /// Skip the next `lines` lines of the base.
    Drop { lines: usize },
    /// Emit these lines.
    Insert { text: Vec<String> },
}

/// A deterministic line-based delta between two document texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDiff {
    ops: Vec<DiffOp>,
}

impl ContentDiff {
    /// Computes the delta turning `from` into `to`.
    pub fn compute(from: &str, to: &str) -> Self {
        let from_lines: Vec<&str> = from.split('\n').collect();
        let to_lines: Vec<&str> = to.split('\n').collect();

        let max_common = from_lines.len().min(to_lines.len());

        let prefix = from_lines
            .iter()
            .zip(to_lines.iter())
            .take(max_common)
            .take_while(|(a, b)| a == b)
            .count();

        let suffix = from_lines
            .iter()
            .rev()
            .zip(to_lines.iter().rev())
            .take(max_common - prefix)
            .take_while(|(a, b)| a == b)
            .count();

        let dropped = from_lines.len() - prefix - suffix;
        let inserted: Vec<String> = to_lines[prefix..to_lines.len() - suffix]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut ops = Vec::new();
        if prefix > 0 {
            ops.push(DiffOp::Keep { lines: prefix });
        }
        if dropped > 0 {
            ops.push(DiffOp::Drop { lines: dropped });
        }
        if !inserted.is_empty() {
            ops.push(DiffOp::Insert { text: inserted });
        }
        if suffix > 0 {
            ops.push(DiffOp::Keep { lines: suffix });
        }

        Self { ops }
    }

    /// Applies this delta to `base`, producing the target text.
    pub fn apply(&self, base: &str) -> Result<String, DiffApplyError> {
        let base_lines: Vec<&str> = base.split('\n').collect();
        let mut cursor = 0usize;
        let mut out: Vec<&str> = Vec::with_capacity(base_lines.len());

        for op in &self.ops {
            match op {
                DiffOp::Keep { lines } => {
                    let end = cursor.checked_add(*lines).filter(|e| *e <= base_lines.len());
                    let end = end.ok_or(DiffApplyError::BaseTooShort {
                        offset: cursor,
                        wanted: *lines,
                        available: base_lines.len() - cursor,
                    })?;
                    out.extend_from_slice(&base_lines[cursor..end]);
                    cursor = end;
                }
                DiffOp::Drop { lines } => {
                    let end = cursor.checked_add(*lines).filter(|e| *e <= base_lines.len());
                    let end = end.ok_or(DiffApplyError::BaseTooShort {
                        offset: cursor,
                        wanted: *lines,
                        available: base_lines.len() - cursor,
                    })?;
                    cursor = end;
                }
                DiffOp::Insert { text } => {
                    out.extend(text.iter().map(|s| s.as_str()));
                }
            }
        }

        if cursor != base_lines.len() {
            return Err(DiffApplyError::TrailingBase {
                unconsumed: base_lines.len() - cursor,
            });
        }

        Ok(out.join("\n"))
    }

    /// True when applying this delta changes nothing.
    pub fn is_identity(&self) -> bool {
        self.ops
            .iter()
            .all(|op| matches!(op, DiffOp::Keep { .. }))
    }

    /// The ops of this delta.
    #[inline]
    pub fn ops(&self) -> &[DiffOp] {
        &self.ops
    }

    /// Serializes for storage in a version record's content field.
    pub fn encode(&self) -> String {
        // A Vec of unit-struct ops cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| "{\"ops\":[]}".to_string())
    }

    /// Decodes a delta from a version record's content field.
    pub fn decode(encoded: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(encoded)
    }
}
