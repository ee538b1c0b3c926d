//! Pages bundle codec
//!
//! Per-page renderings are persisted as one binary blob per version:
//! a CRC32 of the JSON body in the first four bytes (little endian),
//! then the body. Decode verifies the checksum before parsing and
//! fails loudly on any mismatch - a corrupted bundle must never decode
//! into a plausible-looking rendering.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PageRendering;

/// Bundle codec failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    /// Fewer bytes than the checksum frame itself.
    #[error("bundle too short: {0} bytes")]
    TooShort(usize),

    /// Body bytes do not match the recorded checksum.
    #[error("bundle checksum mismatch: recorded {recorded:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum read from the frame.
        recorded: u32,
        /// Checksum of the body as stored.
        computed: u32,
    },

    /// The body failed to parse.
    #[error("bundle body undecodable: {0}")]
    Decode(String),
}

/// An ordered set of page renderings for one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagesBundle {
    /// Pages in page order.
    pub pages: Vec<PageRendering>,
}

impl PagesBundle {
    /// Wraps pages into a bundle.
    pub fn new(pages: Vec<PageRendering>) -> Self {
        Self { pages }
    }

    /// Number of pages in the bundle.
    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True when the bundle holds no pages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Encodes to the checksummed binary form.
    pub fn encode(&self) -> Vec<u8> {
        let body = serde_json::to_vec(&self.pages).unwrap_or_else(|_| b"[]".to_vec());
        let checksum = crc32fast::hash(&body);

        let mut out = Vec::with_capacity(4 + body.len());
        out.extend_from_slice(&checksum.to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Decodes and verifies a checksummed binary bundle.
    pub fn decode(bytes: &[u8]) -> Result<Self, BundleError> {
        if bytes.len() < 4 {
            return Err(BundleError::TooShort(bytes.len()));
        }

        let (frame, body) = bytes.split_at(4);
        let recorded = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
        let computed = crc32fast::hash(body);
        if recorded != computed {
            return Err(BundleError::ChecksumMismatch { recorded, computed });
        }

        let pages: Vec<PageRendering> =
            serde_json::from_slice(body).map_err(|e| BundleError::Decode(e.to_string()))?;
        Ok(Self { pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::VectorNode;

    fn sample_bundle() -> PagesBundle {
        PagesBundle::new(vec![
            PageRendering::new(
                0,
                VectorNode::new("g").with_child(VectorNode::new("rect").with_attr("width", "40")),
            )
            .with_name("Overview"),
            PageRendering::new(1, VectorNode::new("g")),
        ])
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let bundle = sample_bundle();
        let decoded = PagesBundle::decode(&bundle.encode()).unwrap();
        assert_eq!(bundle, decoded);
    }

    #[test]
    fn test_empty_bundle_round_trip() {
        let bundle = PagesBundle::new(Vec::new());
        assert!(bundle.is_empty());
        let decoded = PagesBundle::decode(&bundle.encode()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_corrupted_body_fails_checksum() {
        let mut bytes = sample_bundle().encode();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        let err = PagesBundle::decode(&bytes).unwrap_err();
        assert!(matches!(err, BundleError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_corrupted_frame_fails_checksum() {
        let mut bytes = sample_bundle().encode();
        bytes[0] ^= 0x01;

        let err = PagesBundle::decode(&bytes).unwrap_err();
        assert!(matches!(err, BundleError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_truncated_bundle_too_short() {
        let err = PagesBundle::decode(&[0x01, 0x02]).unwrap_err();
        assert_eq!(err, BundleError::TooShort(2));
    }

    #[test]
    fn test_encode_is_deterministic() {
        assert_eq!(sample_bundle().encode(), sample_bundle().encode());
    }
}
