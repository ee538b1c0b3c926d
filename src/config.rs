//! Engine configuration
//!
//! Tuning knobs for the whole engine in one plain struct. Defaults are
//! conservative and documented; embedders override per deployment.

use std::time::Duration;

use crate::materialize::DEFAULT_HOP_LIMIT;
use crate::render::DEFAULT_RENDER_CACHE_CAPACITY;
use crate::store::DEFAULT_STORE_TIMEOUT;

/// Maximum diff-chain length before the writer forces a keyframe.
///
/// Bounds worst-case materialization at one keyframe read plus this
/// many delta replays while keeping storage growth linear in edits.
pub const DEFAULT_MAX_CHAIN_DEPTH: u32 = 20;

/// Debounce window for WIP autosave coalescing.
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(400);

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Diff-chain length at which the writer re-keyframes.
    pub max_chain_depth: u32,

    /// Bound for every single store backend call.
    pub store_timeout: Duration,

    /// Render cache capacity, in versions.
    pub render_cache_capacity: usize,

    /// WIP autosave coalescing window.
    pub autosave_debounce: Duration,

    /// Materializer hop cap. Must stay above `max_chain_depth`, so
    /// hitting it always means corrupted chain data.
    pub materialize_hop_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            render_cache_capacity: DEFAULT_RENDER_CACHE_CAPACITY,
            autosave_debounce: DEFAULT_AUTOSAVE_DEBOUNCE,
            materialize_hop_limit: DEFAULT_HOP_LIMIT,
        }
    }
}
