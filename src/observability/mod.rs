//! Observability
//!
//! Structured logging for the engine's seams: snapshot freezes, render
//! degradation, autosave flushes, feed refreshes, cache eviction. Logs
//! are the only output channel; nothing here feeds back into behavior.

mod logger;

pub use logger::{LogEvent, Severity};
