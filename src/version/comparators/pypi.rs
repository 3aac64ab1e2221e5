//! PEP 440 version ordering

use std::str::FromStr;

use pep508_rs::pep440_rs::Version;

use crate::ecosystem::Ecosystem;
use crate::version::comparator::VersionComparator;
use crate::version::error::VersionParseError;

pub struct PypiComparator;

impl VersionComparator for PypiComparator {
    type Version = Version;

    fn parse(&self, raw: &str) -> Result<Version, VersionParseError> {
        Version::from_str(raw.trim())
            .map_err(|e| VersionParseError::new(Ecosystem::Pip, raw, e.to_string()))
    }

    /// `1.0RC1` -> `1.0rc1`, `v2.0` -> `2.0`; unparseable input is only trimmed
    fn normalize(&self, raw: &str) -> String {
        self.parse(raw)
            .map(|version| version.to_string())
            .unwrap_or_else(|_| raw.trim().to_string())
    }
}

/// Release segments of a parsed version (`1.2.3` -> `[1, 2, 3]`)
pub fn release_segments(version: &Version) -> Vec<u64> {
    version.release().iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cmp::Ordering;

    #[rstest]
    #[case("1.0", "2.0", Ordering::Less)]
    // implicit trailing zeros
    #[case("1.0", "1.0.0", Ordering::Equal)]
    #[case("1.10", "1.9", Ordering::Greater)]
    // epoch dominates the release tuple
    #[case("1!0.1", "2.0", Ordering::Greater)]
    // dev < pre < final < post
    #[case("1.0.dev1", "1.0a1", Ordering::Less)]
    #[case("1.0a1", "1.0b1", Ordering::Less)]
    #[case("1.0rc1", "1.0", Ordering::Less)]
    #[case("1.0", "1.0.post1", Ordering::Less)]
    #[case("1.0.post1.dev1", "1.0.post1", Ordering::Less)]
    #[case("1.0RC1", "1.0rc1", Ordering::Equal)]
    fn compare_follows_pep440(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(PypiComparator.compare(a, b).unwrap(), expected);
    }

    #[rstest]
    #[case("not a version")]
    #[case("1.0-foo-bar")]
    #[case("")]
    fn parse_rejects_malformed_versions(#[case] input: &str) {
        assert!(PypiComparator.parse(input).is_err());
    }

    #[rstest]
    #[case("1.0RC1", "1.0rc1")]
    #[case(" 2.25.1 ", "2.25.1")]
    #[case("1.0-post1", "1.0.post1")]
    #[case("not a version", "not a version")]
    fn normalize_applies_pep440_normal_form(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(PypiComparator.normalize(input), expected);
    }

    #[test]
    fn release_segments_returns_release_tuple() {
        let version = PypiComparator.parse("1!2.3.4rc1").unwrap();
        assert_eq!(release_segments(&version), vec![2, 3, 4]);
    }
}
