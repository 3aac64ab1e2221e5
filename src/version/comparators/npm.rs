//! npm (semver) version ordering

use semver::{BuildMetadata, Version};

use crate::ecosystem::Ecosystem;
use crate::version::comparator::VersionComparator;
use crate::version::error::VersionParseError;

pub struct NpmComparator;

/// Strip the decorations npm tolerates around a concrete version
///
/// Examples:
/// - " v1.2.3 " -> "1.2.3"
/// - "=1.2.3" -> "1.2.3"
pub fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    let version = version.strip_prefix('=').unwrap_or(version).trim_start();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
/// Does NOT strip 'v' prefix (use `normalize_version` first if needed).
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
/// - "1.2-beta" -> Version(1, 2, 0, pre: beta)
pub fn parse_version(version: &str) -> Option<Version> {
    let (core, suffix) = match version.find(['-', '+']) {
        Some(idx) => version.split_at(idx),
        None => (version, ""),
    };
    let normalized = match core.split('.').count() {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

impl VersionComparator for NpmComparator {
    type Version = Version;

    /// Build metadata is dropped: it never participates in precedence
    fn parse(&self, raw: &str) -> Result<Version, VersionParseError> {
        let Some(mut version) = parse_version(normalize_version(raw)) else {
            return Err(VersionParseError::new(
                Ecosystem::Npm,
                raw,
                "expected MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]",
            ));
        };
        version.build = BuildMetadata::EMPTY;
        Ok(version)
    }

    fn normalize(&self, raw: &str) -> String {
        normalize_version(raw).to_string()
    }
}
