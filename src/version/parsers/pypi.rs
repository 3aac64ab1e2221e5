//! Python version specifier parser (PEP 440 + Poetry shorthands)
//!
//! Supports:
//! - `1.2.3`, `==1.2.3`, `===1.2.3` - exact version
//! - `>=1.0,<2.0` - comma-separated clauses, all must hold
//! - `==`, `!=`, `>=`, `<=`, `>`, `<` - comparison operators
//! - `==1.2.*`, `!=1.2.*`, `1.2.*` - prefix matching
//! - `~=2.2` - compatible release (>=2.2,==2.*)
//! - `^1.2.3`, `~1.2.3` - Poetry caret and tilde, same expansion as npm
//! - `^1.0 || ^2.0` - Poetry union
//!
//! Exclusive comparisons follow PEP 440: `<V` admits no pre-release of V's
//! release and `>V` admits no post-release of it, unless V is one itself.
//! Synthesized upper bounds use the `.dev0` floor of the next release, so
//! `^1.2` keeps `2.0.0rc1` out of range.

use std::ops::Bound;
use std::str::FromStr;

use pep508_rs::pep440_rs::{Operator, Version, VersionSpecifier, VersionSpecifiers};

use crate::ecosystem::Ecosystem;
use crate::version::comparators::PypiComparator;
use crate::version::comparators::pypi::release_segments;
use crate::version::constraint::{Constraint, Interval, IntervalSet};
use crate::version::error::ConstraintParseError;
use crate::version::parser::ConstraintParser;

pub struct PypiConstraintParser;

/// Post-release number no published post-release reaches
const POST_CEILING: u64 = u64::MAX;

/// Render a release tuple as a version string, keeping a non-zero epoch
fn format_release(epoch: u64, release: &[u64]) -> String {
    let release = release
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    if epoch == 0 {
        release
    } else {
        format!("{epoch}!{release}")
    }
}

/// Lowest version of a release, dev builds included (`[2, 0]` -> `2.0.dev0`)
fn release_floor(epoch: u64, release: &[u64]) -> String {
    format!("{}.dev0", format_release(epoch, release))
}

/// Release tuple with its last segment incremented (`[1, 2]` -> `[1, 3]`)
fn bump_last(release: &[u64]) -> Option<Vec<u64>> {
    let mut bumped = release.to_vec();
    let last = bumped.last_mut()?;
    *last = last.checked_add(1)?;
    Some(bumped)
}

/// Turn the boundary of an excluded interval into the matching bound of its complement
fn flip(bound: &Bound<String>) -> Bound<String> {
    match bound {
        Bound::Included(v) => Bound::Excluded(v.clone()),
        Bound::Excluded(v) => Bound::Included(v.clone()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// `<V`
fn below(version: &Version) -> IntervalSet {
    let text = version.to_string();
    if version.any_prerelease() {
        return IntervalSet::single(Interval::less_than(&text));
    }
    let release = release_segments(version);
    let mut intervals = vec![Interval::less_than(&release_floor(version.epoch(), &release))];
    if version.is_post() {
        intervals.push(Interval::half_open(
            &format_release(version.epoch(), &release),
            &text,
        ));
    }
    IntervalSet::new(intervals)
}

/// `>V`
fn above(version: &Version) -> IntervalSet {
    let text = version.to_string();
    if version.is_post() {
        return IntervalSet::single(Interval::greater_than(&text));
    }
    let release = format_release(version.epoch(), &release_segments(version));
    let mut intervals = Vec::new();
    if version.any_prerelease() {
        intervals.push(Interval::new(
            Bound::Excluded(text),
            Bound::Included(release.clone()),
        ));
    }
    intervals.push(Interval::greater_than(&format!("{release}.post{POST_CEILING}")));
    IntervalSet::new(intervals)
}

impl PypiConstraintParser {
    fn error(raw: &str, reason: impl Into<String>) -> ConstraintParseError {
        ConstraintParseError::new(Ecosystem::Pip, raw, reason)
    }

    fn overflow(raw: &str) -> ConstraintParseError {
        Self::error(raw, "release segment out of range")
    }

    fn parse_version(raw: &str, text: &str) -> Result<Version, ConstraintParseError> {
        Version::from_str(text)
            .map_err(|e| Self::error(raw, format!("invalid version '{text}': {e}")))
    }

    /// PEP 440 specifiers of one clause; a bare version reads as `==`
    fn specifiers(raw: &str, clause: &str) -> Result<VersionSpecifiers, ConstraintParseError> {
        let clause = if clause.starts_with(['=', '!', '~', '<', '>']) {
            clause.to_string()
        } else {
            format!("=={clause}")
        };
        VersionSpecifiers::from_str(&clause).map_err(|e| Self::error(raw, e.to_string()))
    }

    /// `1.2` -> `[1.2.dev0, 1.3.dev0)`
    fn prefix_interval(raw: &str, epoch: u64, prefix: &[u64]) -> Result<Interval, ConstraintParseError> {
        let upper = bump_last(prefix).ok_or_else(|| Self::overflow(raw))?;
        Ok(Interval::half_open(
            &release_floor(epoch, prefix),
            &release_floor(epoch, &upper),
        ))
    }

    /// Poetry caret: bump the leftmost non-zero of the given segments
    fn caret_interval(raw: &str, text: &str) -> Result<Interval, ConstraintParseError> {
        let version = Self::parse_version(raw, text)?;
        let bump = |n: &u64| n.checked_add(1).ok_or_else(|| Self::overflow(raw));
        let upper = match release_segments(&version).as_slice() {
            [major, ..] if *major > 0 => vec![bump(major)?, 0, 0],
            [major] => vec![bump(major)?, 0, 0],
            [0, minor, ..] if *minor > 0 => vec![0, bump(minor)?, 0],
            [0, minor] => vec![0, bump(minor)?, 0],
            [0, 0, patch, ..] => vec![0, 0, bump(patch)?],
            _ => return Err(Self::error(raw, "caret needs a release number")),
        };
        Ok(Interval::half_open(
            &version.to_string(),
            &release_floor(version.epoch(), &upper),
        ))
    }

    /// Poetry tilde: `~1.2.3` -> `[1.2.3, 1.3.0.dev0)`, `~1` -> `[1, 2.0.0.dev0)`
    fn tilde_interval(raw: &str, text: &str) -> Result<Interval, ConstraintParseError> {
        let version = Self::parse_version(raw, text)?;
        let bump = |n: &u64| n.checked_add(1).ok_or_else(|| Self::overflow(raw));
        let upper = match release_segments(&version).as_slice() {
            [major] => vec![bump(major)?, 0, 0],
            [major, minor, ..] => vec![*major, bump(minor)?, 0],
            [] => return Err(Self::error(raw, "tilde needs a release number")),
        };
        Ok(Interval::half_open(
            &version.to_string(),
            &release_floor(version.epoch(), &upper),
        ))
    }

    /// Versions admitted by one PEP 440 specifier
    fn specifier_set(raw: &str, specifier: &VersionSpecifier) -> Result<IntervalSet, ConstraintParseError> {
        let version = specifier.version();
        let text = version.to_string();
        let release = release_segments(version);

        let set = match specifier.operator() {
            Operator::Equal | Operator::ExactEqual => IntervalSet::single(Interval::exactly(&text)),
            Operator::EqualStar => {
                IntervalSet::single(Self::prefix_interval(raw, version.epoch(), &release)?)
            }
            Operator::NotEqual => IntervalSet::new(vec![
                Interval::less_than(&text),
                Interval::greater_than(&text),
            ]),
            Operator::NotEqualStar => {
                let excluded = Self::prefix_interval(raw, version.epoch(), &release)?;
                IntervalSet::new(vec![
                    Interval::new(Bound::Unbounded, flip(&excluded.lower)),
                    Interval::new(flip(&excluded.upper), Bound::Unbounded),
                ])
            }
            // `~=2.2.1` is `>=2.2.1, ==2.2.*`
            Operator::TildeEqual => {
                let prefix = &release[..release.len().saturating_sub(1)];
                let upper = bump_last(prefix).ok_or_else(|| Self::overflow(raw))?;
                IntervalSet::single(Interval::half_open(
                    &text,
                    &release_floor(version.epoch(), &upper),
                ))
            }
            Operator::LessThan => below(version),
            Operator::LessThanEqual => IntervalSet::single(Interval::at_most(&text)),
            Operator::GreaterThan => above(version),
            Operator::GreaterThanEqual => IntervalSet::single(Interval::at_least(&text)),
        };
        Ok(set)
    }

    /// Parse one clause such as `>=1.0` into the versions it admits
    fn parse_clause(raw: &str, clause: &str) -> Result<IntervalSet, ConstraintParseError> {
        let clause = clause.trim();
        if clause.is_empty() {
            return Err(Self::error(raw, "empty clause"));
        }
        if clause == "*" {
            return Ok(IntervalSet::single(Interval::full()));
        }
        if let Some(text) = clause.strip_prefix("===") {
            let text = text.trim();
            Self::parse_version(raw, text)?;
            return Ok(IntervalSet::single(Interval::exactly(text)));
        }
        if let Some(text) = clause.strip_prefix('^') {
            return Ok(IntervalSet::single(Self::caret_interval(raw, text.trim())?));
        }
        if !clause.starts_with("~=")
            && let Some(text) = clause.strip_prefix('~')
        {
            return Ok(IntervalSet::single(Self::tilde_interval(raw, text.trim())?));
        }

        let mut set = IntervalSet::single(Interval::full());
        for specifier in Self::specifiers(raw, clause)?.iter() {
            set = set.intersect(&Self::specifier_set(raw, specifier)?, &PypiComparator)?;
        }
        Ok(set)
    }

    /// Literal form of a single-clause exact pin, if the spec is one
    fn exact_literal(spec: &str) -> Option<String> {
        if spec.contains([',', '|']) {
            return None;
        }
        if let Some(text) = spec.strip_prefix("===") {
            let text = text.trim();
            return (!text.is_empty()).then(|| text.to_string());
        }
        let specifiers = Self::specifiers(spec, spec).ok()?;
        match &*specifiers {
            [specifier] if *specifier.operator() == Operator::Equal => {
                Some(specifier.version().to_string())
            }
            _ => None,
        }
    }
}

impl ConstraintParser for PypiConstraintParser {
    fn parse(&self, raw: &str) -> Result<Constraint, ConstraintParseError> {
        let mut spec = raw.trim();
        if let Some(inner) = spec.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            spec = inner.trim();
        }
        if spec.is_empty() {
            return Ok(Constraint::Intervals(IntervalSet::single(Interval::full())));
        }

        if let Some(literal) = Self::exact_literal(spec) {
            return Ok(Constraint::Exact(literal));
        }

        let mut union = IntervalSet::empty();
        for branch in spec.split("||") {
            let mut set = IntervalSet::single(Interval::full());
            for clause in branch.split(',') {
                let clause_set = Self::parse_clause(raw, clause)?;
                set = set.intersect(&clause_set, &PypiComparator)?;
            }
            union = union.union(set);
        }
        Ok(Constraint::Intervals(union))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::comparator::VersionComparator;
    use rstest::rstest;

    fn satisfies(raw: &str, version: &str) -> bool {
        match PypiConstraintParser.parse(raw).unwrap() {
            Constraint::Exact(literal) => literal == PypiComparator.normalize(version),
            Constraint::Intervals(set) => set.contains_version(Ecosystem::Pip, version).unwrap(),
            Constraint::Wildcard(_) => unreachable!("pip has no structural wildcards"),
        }
    }

    #[rstest]
    #[case("1.2.3", "1.2.3")]
    #[case("==1.2.3", "1.2.3")]
    #[case("== 1.0RC1", "1.0rc1")]
    #[case("===1.0-custom", "1.0-custom")]
    fn parse_single_pin_is_exact(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(
            PypiConstraintParser.parse(raw).unwrap(),
            Constraint::Exact(expected.to_string())
        );
    }

    #[rstest]
    #[case(">=1.0,<2.0", vec![Interval::half_open("1.0", "2.0.dev0")])]
    #[case(">=1.0, <2.0", vec![Interval::half_open("1.0", "2.0.dev0")])]
    #[case("(>=1.0,<2.0)", vec![Interval::half_open("1.0", "2.0.dev0")])]
    #[case("<2.0rc1", vec![Interval::less_than("2.0rc1")])]
    #[case(
        "<1.0.post2",
        vec![Interval::less_than("1.0.dev0"), Interval::half_open("1.0", "1.0.post2")]
    )]
    #[case(">1.0", vec![Interval::greater_than("1.0.post18446744073709551615")])]
    #[case(">1.0.post1", vec![Interval::greater_than("1.0.post1")])]
    #[case("~=2.2", vec![Interval::half_open("2.2", "3.dev0")])]
    #[case("~=2.2.1", vec![Interval::half_open("2.2.1", "2.3.dev0")])]
    #[case("^1.2.3", vec![Interval::half_open("1.2.3", "2.0.0.dev0")])]
    #[case("^0.2.3", vec![Interval::half_open("0.2.3", "0.3.0.dev0")])]
    #[case("^0.0.3", vec![Interval::half_open("0.0.3", "0.0.4.dev0")])]
    #[case("^0.2", vec![Interval::half_open("0.2", "0.3.0.dev0")])]
    #[case("~1.2.3", vec![Interval::half_open("1.2.3", "1.3.0.dev0")])]
    #[case("~1", vec![Interval::half_open("1", "2.0.0.dev0")])]
    #[case("==1.2.*", vec![Interval::half_open("1.2.dev0", "1.3.dev0")])]
    #[case("*", vec![Interval::full()])]
    #[case(
        "!=1.5",
        vec![Interval::less_than("1.5"), Interval::greater_than("1.5")]
    )]
    #[case(
        "^1.0 || ^3.0",
        vec![
            Interval::half_open("1.0", "2.0.0.dev0"),
            Interval::half_open("3.0", "4.0.0.dev0"),
        ]
    )]
    #[case(">=2.0,<1.0", vec![])]
    fn parse_builds_expected_intervals(#[case] raw: &str, #[case] expected: Vec<Interval>) {
        assert_eq!(
            PypiConstraintParser.parse(raw).unwrap(),
            Constraint::Intervals(IntervalSet::new(expected))
        );
    }

    #[rstest]
    #[case(">=1.0,<2.0", "1.9", true)]
    #[case(">=1.0,<2.0", "2.0", false)]
    #[case(">=1.0,<2.0", "0.9", false)]
    // exclusive bounds keep pre-releases of the bound out
    #[case(">=1.0,<2.0", "2.0rc1", false)]
    #[case(">=1.0,<2.0", "2.0.dev3", false)]
    #[case("<2.0", "1.9.post1", true)]
    #[case("<2.0rc2", "2.0rc1", true)]
    #[case("<1.0.post2", "1.0.post1", true)]
    #[case("<1.0.post2", "1.0rc1", false)]
    // ... and post-releases of the bound
    #[case(">1.0", "1.0.post1", false)]
    #[case(">1.0", "1.0.1", true)]
    #[case(">1.0", "1.0.1.dev0", true)]
    #[case(">1.0.post1", "1.0.post2", true)]
    #[case(">1.0rc1", "1.0", true)]
    #[case(">1.0rc1", "1.0.post1", false)]
    #[case("~=2.2", "2.9.9", true)]
    #[case("~=2.2", "3.0", false)]
    #[case("~=2.2", "3.0.dev0", false)]
    #[case("^1.2", "2.0.0rc1", false)]
    #[case("~=2.2.1", "2.2.5", true)]
    #[case("~=2.2.1", "2.3.0", false)]
    #[case(">=1.0,!=1.5.0", "1.5", false)]
    #[case(">=1.0,!=1.5.0", "1.4.0", true)]
    #[case("==1.2.*", "1.2.7", true)]
    #[case("==1.2.*", "1.2rc1", true)]
    #[case("==1.2.*", "1.3", false)]
    #[case("!=1.2.*", "1.2.7", false)]
    #[case("!=1.2.*", "1.3", true)]
    #[case("^0.2.3", "0.2.9", true)]
    #[case("^0.2.3", "0.3.0", false)]
    #[case("1.0", "1.0", true)]
    #[case("1.0", "1.0.1", false)]
    fn parsed_constraint_membership(
        #[case] raw: &str,
        #[case] version: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(satisfies(raw, version), expected);
    }

    #[rstest]
    #[case("invalid>>=spec")]
    #[case(">=")]
    #[case("~=1")]
    #[case(">=1.0,<abc")]
    #[case("requests")]
    #[case("==1.18446744073709551615.*")]
    #[case("!=1.18446744073709551615.*")]
    #[case("~=1.18446744073709551615.0")]
    #[case("^18446744073709551615")]
    #[case("~1.18446744073709551615")]
    fn parse_rejects_invalid_specifiers(#[case] raw: &str) {
        let err = PypiConstraintParser.parse(raw).unwrap_err();
        assert_eq!(err.ecosystem, Ecosystem::Pip);
        assert_eq!(err.input, raw);
    }
}
