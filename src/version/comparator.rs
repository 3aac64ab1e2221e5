//! Version ordering abstraction for different ecosystems

use std::cmp::Ordering;

use crate::version::error::VersionParseError;

/// Trait for ecosystem-specific version ordering
///
/// Each ecosystem has its own precedence rules:
/// - npm: semver, pre-releases sort before their release
/// - Maven: segment-wise, qualifiers ranked `alpha < beta < milestone < rc < release < sp`
/// - pip: PEP 440 epoch, release tuple, then dev < pre < final < post
pub trait VersionComparator {
    /// Parsed form of a version, totally ordered under the ecosystem's rules
    type Version: Ord;

    /// Parse a concrete version string
    fn parse(&self, raw: &str) -> Result<Self::Version, VersionParseError>;

    /// Normalized literal form used for exact (string) matching
    fn normalize(&self, raw: &str) -> String {
        raw.trim().to_string()
    }

    /// Compare two concrete version strings
    fn compare(&self, a: &str, b: &str) -> Result<Ordering, VersionParseError> {
        Ok(self.parse(a)?.cmp(&self.parse(b)?))
    }
}
