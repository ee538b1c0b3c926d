//! sketchvault - versioned snapshot storage and structural visual diff
//! for diagram documents
//!
//! A single working document is edited continuously (autosaved into one
//! work-in-progress record) and frozen on demand into immutable,
//! semantically-versioned snapshots. History is stored as keyframes
//! plus bounded diff chains; any snapshot materializes on demand
//! without replaying the whole history. Two snapshots' renderings can
//! be compared structurally: elements matched, classified, scored with
//! a coverage metric, and composed into a highlighted overlay.

pub mod config;
pub mod materialize;
pub mod observability;
pub mod render;
pub mod semver;
pub mod store;
pub mod subscription;
pub mod visualdiff;
pub mod writer;
