//! Semantic Version Model
//!
//! Version identifiers follow `major.minor.patch` with an optional
//! fourth `sub` component in [1, 999]:
//! - `1.2.0` is a main version
//! - `1.2.0.3` is the third sub-version checkpoint under `1.2.0`
//! - `0.0.0` is reserved for the single work-in-progress record
//!
//! The grammar `^\d+\.\d+\.\d+(\.\d+)?$` is the one bit-exact external
//! contract of this crate. Everything else about a version string is
//! policy and lives here:
//! - a sub-version requires its three-component parent to exist
//! - the WIP identifier can never be chosen as a snapshot name
//! - "latest" ordering is by creation time, never by version number

mod errors;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

pub use errors::{ValidationResult, VersionValidationError};

/// The reserved identifier of the live working copy.
///
/// It matches the version grammar so that `validate` rejects it with an
/// explicit `Reserved` reason rather than a format error, and it orders
/// below every real version.
pub const WIP_VERSION: &str = "0.0.0";

/// Recommended name for the first snapshot of a document.
pub const FIRST_VERSION: &str = "1.0.0";

/// Inclusive upper bound for the sub-version component.
pub const MAX_SUB_VERSION: u32 = 999;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d+\.\d+\.\d+(\.\d+)?$").expect("version grammar is a valid regex")
    })
}

/// A parsed `major.minor.patch[.sub]` identifier.
///
/// Ordering is numeric by `(major, minor, patch, sub)`; a main version
/// orders before its own sub-versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
    sub: Option<u32>,
}

impl SemanticVersion {
    /// Creates a main version.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            sub: None,
        }
    }

    /// Creates a sub-version checkpoint under `major.minor.patch`.
    pub fn with_sub(major: u32, minor: u32, patch: u32, sub: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            sub: Some(sub),
        }
    }

    #[inline]
    pub fn major(&self) -> u32 {
        self.major
    }

    #[inline]
    pub fn minor(&self) -> u32 {
        self.minor
    }

    #[inline]
    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// The sub-version component, if this is a sub-version.
    #[inline]
    pub fn sub(&self) -> Option<u32> {
        self.sub
    }

    /// Returns true if this is a `major.minor.patch.sub` checkpoint.
    #[inline]
    pub fn is_sub_version(&self) -> bool {
        self.sub.is_some()
    }

    /// Returns true if this is the reserved work-in-progress identifier.
    pub fn is_wip(&self) -> bool {
        self.sub.is_none() && self.major == 0 && self.minor == 0 && self.patch == 0
    }

    /// The `major.minor.patch` parent of a sub-version, or self for a
    /// main version.
    pub fn parent(&self) -> SemanticVersion {
        SemanticVersion::new(self.major, self.minor, self.patch)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, sub),
            None => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.sub)
            .cmp(&(other.major, other.minor, other.patch, other.sub))
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionValidationError;

    /// Parses a version string against the grammar only.
    ///
    /// Policy checks (reserved value, sub range, parent existence) are
    /// the job of [`validate`]; parsing accepts any grammatical string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionValidationError::Empty);
        }
        if !version_pattern().is_match(trimmed) {
            return Err(VersionValidationError::FormatInvalid(trimmed.to_string()));
        }

        let components = trimmed
            .split('.')
            .map(|p| {
                p.parse::<u32>()
                    .map_err(|_| VersionValidationError::FormatInvalid(trimmed.to_string()))
            })
            .collect::<Result<Vec<u32>, _>>()?;

        match components.as_slice() {
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            [major, minor, patch, sub] => Ok(Self::with_sub(*major, *minor, *patch, *sub)),
            // Unreachable for grammatical input; kept as a format error.
            _ => Err(VersionValidationError::FormatInvalid(trimmed.to_string())),
        }
    }
}

/// Validates a candidate snapshot name against the owner's existing
/// version set.
///
/// Checks, in order:
/// 1. `Empty` - blank input
/// 2. `FormatInvalid` - grammar mismatch
/// 3. `Reserved` - equals the WIP identifier
/// 4. `SubOutOfRange` - sub component outside [1, 999]
/// 5. `ParentMissing` - sub-version whose `major.minor.patch` parent is
///    not in `existing`
pub fn validate(candidate: &str, existing: &[String]) -> ValidationResult<()> {
    let parsed: SemanticVersion = candidate.parse()?;

    if parsed.is_wip() {
        return Err(VersionValidationError::Reserved(candidate.trim().to_string()));
    }

    if let Some(sub) = parsed.sub() {
        if sub < 1 || sub > MAX_SUB_VERSION {
            return Err(VersionValidationError::SubOutOfRange(sub));
        }

        let parent = parsed.parent().to_string();
        if !existing.iter().any(|v| v == &parent) {
            return Err(VersionValidationError::ParentMissing(parent));
        }
    }

    Ok(())
}

/// Recommends the next main version for an owner.
///
/// Among all non-WIP main versions in `existing`, takes the numeric
/// maximum by `(major, minor, patch)` and bumps the minor component.
/// With no history the recommendation is [`FIRST_VERSION`].
///
/// Unparseable entries are skipped rather than failing the
/// recommendation: a recommendation must always be producible.
pub fn next_main_version(existing: &[String]) -> String {
    let latest = existing
        .iter()
        .filter_map(|v| v.parse::<SemanticVersion>().ok())
        .filter(|v| !v.is_sub_version() && !v.is_wip())
        .max();

    match latest {
        Some(v) => SemanticVersion::new(v.major(), v.minor() + 1, 0).to_string(),
        None => FIRST_VERSION.to_string(),
    }
}

/// Recommends the next sub-version under `parent`.
///
/// Returns `parent.(max existing sub + 1)`, or `parent.1` when the
/// parent has no sub-versions yet.
pub fn next_sub_version(existing: &[String], parent: &str) -> ValidationResult<String> {
    let parent_version: SemanticVersion = parent.parse()?;
    let parent_version = parent_version.parent();

    let max_sub = existing
        .iter()
        .filter_map(|v| v.parse::<SemanticVersion>().ok())
        .filter(|v| v.parent() == parent_version)
        .filter_map(|v| v.sub())
        .max()
        .unwrap_or(0);

    Ok(SemanticVersion::with_sub(
        parent_version.major(),
        parent_version.minor(),
        parent_version.patch(),
        max_sub + 1,
    )
    .to_string())
}
