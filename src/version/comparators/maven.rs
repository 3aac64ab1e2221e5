//! Maven version ordering
//!
//! Versions are split into items on `.`, `-` and digit/letter transitions
//! (`1.0-alpha1` -> `1`, `0`, `alpha`, `1`). Items compare pairwise:
//! - two numbers compare numerically
//! - a number sorts after any qualifier (`1.0.1` > `1.0-rc`)
//! - two qualifiers compare by rank, unknown qualifiers lexically after `sp`
//!
//! The shorter version is padded with `0` / release items, so `1.0`,
//! `1.0.0` and `1.0-ga` are all equal.

use std::cmp::Ordering;

use crate::ecosystem::Ecosystem;
use crate::version::comparator::VersionComparator;
use crate::version::error::VersionParseError;

pub struct MavenComparator;

/// One item of a tokenized Maven version
#[derive(Debug, Clone)]
enum Item {
    Number(u64),
    Qualifier(String),
}

/// Tokenized Maven version with trailing padding items removed
#[derive(Debug, Clone)]
pub struct MavenVersion {
    items: Vec<Item>,
}

/// Rank of well-known qualifiers; releases (`""`, `ga`, `final`, `release`) share one rank
fn qualifier_rank(qualifier: &str) -> Option<u8> {
    match qualifier {
        "alpha" => Some(0),
        "beta" => Some(1),
        "milestone" => Some(2),
        "rc" | "cr" => Some(3),
        "snapshot" => Some(4),
        "" | "ga" | "final" | "release" => Some(5),
        "sp" => Some(6),
        _ => None,
    }
}

const RELEASE_RANK: u8 = 5;

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    match (qualifier_rank(a), qualifier_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

impl Item {
    fn is_padding(&self) -> bool {
        match self {
            Item::Number(n) => *n == 0,
            Item::Qualifier(q) => qualifier_rank(q) == Some(RELEASE_RANK),
        }
    }

    /// Compare against the implicit padding item of a shorter version
    fn cmp_padding(&self) -> Ordering {
        match self {
            Item::Number(n) => n.cmp(&0),
            Item::Qualifier(q) => compare_qualifiers(q, ""),
        }
    }
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Item::Number(a), Item::Number(b)) => a.cmp(b),
            (Item::Number(_), Item::Qualifier(_)) => Ordering::Greater,
            (Item::Qualifier(_), Item::Number(_)) => Ordering::Less,
            (Item::Qualifier(a), Item::Qualifier(b)) => compare_qualifiers(a, b),
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Item {}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for i in 0..len {
            let ordering = match (self.items.get(i), other.items.get(i)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(a), None) => a.cmp_padding(),
                (None, Some(b)) => b.cmp_padding().reverse(),
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Expand single-letter qualifier shorthands (`a1` -> `alpha1`)
fn expand_alias(qualifier: &str, followed_by_digit: bool) -> String {
    match qualifier {
        "a" if followed_by_digit => "alpha".to_string(),
        "b" if followed_by_digit => "beta".to_string(),
        "m" if followed_by_digit => "milestone".to_string(),
        "cr" => "rc".to_string(),
        other => other.to_string(),
    }
}

fn tokenize(raw: &str) -> Option<Vec<Item>> {
    let lowered = raw.to_ascii_lowercase();
    let mut items = Vec::new();

    for segment in lowered.split(['.', '-']) {
        if segment.is_empty() {
            // "1..2" or a trailing separator
            return None;
        }
        let chars: Vec<char> = segment.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let is_digit = chars[start].is_ascii_digit();
            let mut end = start;
            while end < chars.len() && chars[end].is_ascii_digit() == is_digit {
                end += 1;
            }
            let token: String = chars[start..end].iter().collect();
            if is_digit {
                items.push(Item::Number(token.parse().ok()?));
            } else {
                if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return None;
                }
                let followed_by_digit = end < chars.len();
                items.push(Item::Qualifier(expand_alias(&token, followed_by_digit)));
            }
            start = end;
        }
    }

    while items.last().is_some_and(Item::is_padding) {
        items.pop();
    }
    Some(items)
}

impl VersionComparator for MavenComparator {
    type Version = MavenVersion;

    fn parse(&self, raw: &str) -> Result<MavenVersion, VersionParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError::new(
                Ecosystem::Maven,
                raw,
                "empty version",
            ));
        }
        if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(VersionParseError::new(
                Ecosystem::Maven,
                raw,
                "version must start with a digit",
            ));
        }
        tokenize(trimmed)
            .map(|items| MavenVersion { items })
            .ok_or_else(|| {
                VersionParseError::new(Ecosystem::Maven, raw, "unexpected character in version")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0", "2.0", Ordering::Less)]
    #[case("1.10", "1.9", Ordering::Greater)]
    // padding with zero / release items
    #[case("1.0", "1.0.0", Ordering::Equal)]
    #[case("1.0-ga", "1.0", Ordering::Equal)]
    #[case("1.0.Final", "1.0", Ordering::Equal)]
    #[case("1.0.1", "1.0", Ordering::Greater)]
    // qualifier ranking
    #[case("1.0-alpha1", "1.0-beta1", Ordering::Less)]
    #[case("1.0-beta2", "1.0-milestone1", Ordering::Less)]
    #[case("1.0-M1", "1.0-RC1", Ordering::Less)]
    #[case("1.0-rc1", "1.0-CR1", Ordering::Equal)]
    #[case("1.0-rc1", "1.0", Ordering::Less)]
    #[case("1.0-SNAPSHOT", "1.0", Ordering::Less)]
    #[case("1.0", "1.0-sp1", Ordering::Less)]
    #[case("1.0-a1", "1.0-alpha1", Ordering::Equal)]
    // numbers sort after qualifiers
    #[case("1.0.1", "1.0-rc1", Ordering::Greater)]
    // unknown qualifiers sort after known ones, lexically among themselves
    #[case("1.0-sp1", "1.0-foo", Ordering::Less)]
    #[case("1.0-bar", "1.0-foo", Ordering::Less)]
    #[case("2.14.1", "2.17.0", Ordering::Less)]
    #[case("2.15.0-rc2", "2.15.0", Ordering::Less)]
    fn compare_follows_maven_precedence(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(MavenComparator.compare(a, b).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("latest")]
    #[case("1..2")]
    #[case("1.0-")]
    #[case("1.0/2")]
    fn parse_rejects_malformed_versions(#[case] input: &str) {
        assert!(MavenComparator.parse(input).is_err());
    }
}
