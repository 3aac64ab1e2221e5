//! Normalized declared-version constraints
//!
//! Every ecosystem grammar folds into one of three shapes:
//! - [`Constraint::Exact`]: a single concrete literal
//! - [`Constraint::Intervals`]: a union of intervals over the ecosystem's ordering
//! - [`Constraint::Wildcard`]: a structural prefix pattern (Gradle `1.2.+`)
//!
//! Interval bounds are kept as version strings and compared with the
//! ecosystem's [`VersionComparator`], so a constraint carries no
//! ecosystem-specific types and prints back to a canonical form:
//!
//! ```text
//! =1.2.3                exact
//! [1.0,2.0),(3.0,)      interval set (Maven bracket notation, comma-joined)
//! none                  empty interval set
//! 1.2.+  /  +           wildcard
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

use thiserror::Error;

use crate::ecosystem::Ecosystem;
use crate::version::comparator::VersionComparator;
use crate::version::comparators::{MavenComparator, NpmComparator, PypiComparator};
use crate::version::error::VersionParseError;

/// Normalized declared-version expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A single concrete version literal (already normalized)
    Exact(String),
    /// Ordered union of intervals
    Intervals(IntervalSet),
    /// Structural prefix pattern
    Wildcard(WildcardPattern),
}

/// A contiguous range of versions; bounds are concrete version strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub lower: Bound<String>,
    pub upper: Bound<String>,
}

/// Union of intervals, kept in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

/// Prefix pattern: `1.2.+` has prefix `["1", "2"]`, `+` has an empty prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    prefix: Vec<String>,
}

impl Interval {
    pub fn new(lower: Bound<String>, upper: Bound<String>) -> Self {
        Self { lower, upper }
    }

    /// (,) - every version
    pub fn full() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// [v,v]
    pub fn exactly(version: &str) -> Self {
        Self::new(
            Bound::Included(version.to_string()),
            Bound::Included(version.to_string()),
        )
    }

    /// [from,to]
    pub fn closed(from: &str, to: &str) -> Self {
        Self::new(
            Bound::Included(from.to_string()),
            Bound::Included(to.to_string()),
        )
    }

    /// [from,to)
    pub fn half_open(from: &str, to: &str) -> Self {
        Self::new(
            Bound::Included(from.to_string()),
            Bound::Excluded(to.to_string()),
        )
    }

    /// [from,)
    pub fn at_least(from: &str) -> Self {
        Self::new(Bound::Included(from.to_string()), Bound::Unbounded)
    }

    /// (from,)
    pub fn greater_than(from: &str) -> Self {
        Self::new(Bound::Excluded(from.to_string()), Bound::Unbounded)
    }

    /// (,to]
    pub fn at_most(to: &str) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(to.to_string()))
    }

    /// (,to)
    pub fn less_than(to: &str) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(to.to_string()))
    }

    /// Check whether a parsed version lies within this interval
    pub fn contains<C: VersionComparator>(
        &self,
        comparator: &C,
        version: &C::Version,
    ) -> Result<bool, VersionParseError> {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(v) => *version >= comparator.parse(v)?,
            Bound::Excluded(v) => *version > comparator.parse(v)?,
        };
        if !above_lower {
            return Ok(false);
        }
        Ok(match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(v) => *version <= comparator.parse(v)?,
            Bound::Excluded(v) => *version < comparator.parse(v)?,
        })
    }

    /// Whether no version can satisfy both bounds (`[2.0,1.0]`, `(1.0,1.0]`)
    pub fn is_empty<C: VersionComparator>(&self, comparator: &C) -> Result<bool, VersionParseError> {
        let (lower, lower_inclusive) = match &self.lower {
            Bound::Unbounded => return Ok(false),
            Bound::Included(v) => (v, true),
            Bound::Excluded(v) => (v, false),
        };
        let (upper, upper_inclusive) = match &self.upper {
            Bound::Unbounded => return Ok(false),
            Bound::Included(v) => (v, true),
            Bound::Excluded(v) => (v, false),
        };
        Ok(match comparator.compare(lower, upper)? {
            Ordering::Less => false,
            Ordering::Equal => !(lower_inclusive && upper_inclusive),
            Ordering::Greater => true,
        })
    }

    /// Overlap of two intervals, `None` when they are disjoint
    pub fn intersect<C: VersionComparator>(
        &self,
        other: &Interval,
        comparator: &C,
    ) -> Result<Option<Interval>, VersionParseError> {
        let lower = tighter_bound(&self.lower, &other.lower, comparator, Ordering::Greater)?;
        let upper = tighter_bound(&self.upper, &other.upper, comparator, Ordering::Less)?;
        let interval = Interval::new(lower, upper);
        if interval.is_empty(comparator)? {
            Ok(None)
        } else {
            Ok(Some(interval))
        }
    }
}

/// Pick the more restrictive of two bounds on the same side.
///
/// `wanted` is the ordering that makes a bound tighter: `Greater` for lower
/// bounds, `Less` for upper bounds. On equal versions the exclusive bound wins.
fn tighter_bound<C: VersionComparator>(
    a: &Bound<String>,
    b: &Bound<String>,
    comparator: &C,
    wanted: Ordering,
) -> Result<Bound<String>, VersionParseError> {
    let (av, bv) = match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => return Ok(other.clone()),
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            (x, y)
        }
    };
    let ordering = comparator.compare(av, bv)?;
    Ok(if ordering == wanted {
        a.clone()
    } else if ordering == wanted.reverse() {
        b.clone()
    } else if matches!(a, Bound::Excluded(_)) {
        a.clone()
    } else {
        b.clone()
    })
}

impl IntervalSet {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    /// The set that matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(interval: Interval) -> Self {
        Self::new(vec![interval])
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Union (`||`): concatenation, order preserved
    pub fn union(mut self, other: IntervalSet) -> Self {
        self.intervals.extend(other.intervals);
        self
    }

    /// Intersection (AND of clauses): pairwise overlaps, empty overlaps dropped
    pub fn intersect<C: VersionComparator>(
        &self,
        other: &IntervalSet,
        comparator: &C,
    ) -> Result<IntervalSet, VersionParseError> {
        let mut intervals = Vec::new();
        for a in &self.intervals {
            for b in &other.intervals {
                if let Some(overlap) = a.intersect(b, comparator)? {
                    intervals.push(overlap);
                }
            }
        }
        Ok(IntervalSet::new(intervals))
    }

    /// Check whether a parsed version lies in any interval
    pub fn contains<C: VersionComparator>(
        &self,
        comparator: &C,
        version: &C::Version,
    ) -> Result<bool, VersionParseError> {
        for interval in &self.intervals {
            if interval.contains(comparator, version)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Check whether a concrete version string of `ecosystem` lies in any interval
    pub fn contains_version(
        &self,
        ecosystem: Ecosystem,
        version: &str,
    ) -> Result<bool, VersionParseError> {
        match ecosystem {
            Ecosystem::Npm => self.contains(&NpmComparator, &NpmComparator.parse(version)?),
            Ecosystem::Maven => self.contains(&MavenComparator, &MavenComparator.parse(version)?),
            Ecosystem::Pip => self.contains(&PypiComparator, &PypiComparator.parse(version)?),
        }
    }
}

impl WildcardPattern {
    /// Build a pattern from the text before `+` (`"1.2."`, `"1.2"` or `""`)
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim().trim_end_matches('.');
        let prefix = if prefix.is_empty() {
            Vec::new()
        } else {
            prefix.split('.').map(str::to_string).collect()
        };
        Self { prefix }
    }

    /// Pattern that matches every version (`+`, `latest.release`)
    pub fn any() -> Self {
        Self { prefix: Vec::new() }
    }

    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// A candidate matches when its dot-separated segments start with the
    /// prefix segments and either continue past them or equal them exactly
    pub fn matches(&self, candidate: &str) -> bool {
        let segments: Vec<&str> = candidate.trim().split('.').collect();
        segments.len() >= self.prefix.len()
            && self
                .prefix
                .iter()
                .zip(&segments)
                .all(|(expected, actual)| expected == actual)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Bound::Included(v) => write!(f, "[{v}")?,
            Bound::Excluded(v) => write!(f, "({v}")?,
            Bound::Unbounded => f.write_str("(")?,
        }
        f.write_str(",")?;
        match &self.upper {
            Bound::Included(v) => write!(f, "{v}]"),
            Bound::Excluded(v) => write!(f, "{v})"),
            Bound::Unbounded => f.write_str(")"),
        }
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.intervals.is_empty() {
            return f.write_str("none");
        }
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{interval}")?;
        }
        Ok(())
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            f.write_str("+")
        } else {
            write!(f, "{}.+", self.prefix.join("."))
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Exact(v) => write!(f, "={v}"),
            Constraint::Intervals(set) => write!(f, "{set}"),
            Constraint::Wildcard(pattern) => write!(f, "{pattern}"),
        }
    }
}

/// Text that is not a canonical constraint form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid canonical constraint '{0}'")]
pub struct CanonicalFormError(pub String);

impl FromStr for Constraint {
    type Err = CanonicalFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "none" {
            return Ok(Constraint::Intervals(IntervalSet::empty()));
        }
        if let Some(version) = s.strip_prefix('=') {
            let version = version.trim();
            if version.is_empty() {
                return Err(CanonicalFormError(s.to_string()));
            }
            return Ok(Constraint::Exact(version.to_string()));
        }
        if s == "+" {
            return Ok(Constraint::Wildcard(WildcardPattern::any()));
        }
        if let Some(prefix) = s.strip_suffix(".+") {
            return Ok(Constraint::Wildcard(WildcardPattern::new(prefix)));
        }
        parse_bracket_groups(s)
            .map(|intervals| Constraint::Intervals(IntervalSet::new(intervals)))
            .ok_or_else(|| CanonicalFormError(s.to_string()))
    }
}

/// Parse comma-joined bracket groups: `[1.0,2.0)`, `(,1.0],[1.2,)`, `[1.5]`
///
/// Returns `None` on any structural error. Bound values are not checked
/// against an ecosystem's version grammar here.
pub(crate) fn parse_bracket_groups(input: &str) -> Option<Vec<Interval>> {
    let mut intervals = Vec::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let lower_inclusive = match rest.chars().next()? {
            '[' => true,
            '(' => false,
            _ => return None,
        };
        let close = rest.find([']', ')'])?;
        let upper_inclusive = rest[close..].starts_with(']');
        let body = &rest[1..close];
        if body.contains(['[', '(']) {
            return None;
        }

        let interval = match body.split_once(',') {
            None => {
                // [1.5] pins a single version
                let version = body.trim();
                if !lower_inclusive || !upper_inclusive || version.is_empty() {
                    return None;
                }
                Interval::exactly(version)
            }
            Some((lower, upper)) => {
                if upper.contains(',') {
                    return None;
                }
                Interval::new(
                    make_bound(lower, lower_inclusive),
                    make_bound(upper, upper_inclusive),
                )
            }
        };
        intervals.push(interval);

        rest = rest[close + 1..].trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
            if rest.is_empty() {
                return None;
            }
        } else if !rest.is_empty() {
            return None;
        }
    }

    if intervals.is_empty() {
        None
    } else {
        Some(intervals)
    }
}

fn make_bound(raw: &str, inclusive: bool) -> Bound<String> {
    let value = raw.trim();
    if value.is_empty() {
        Bound::Unbounded
    } else if inclusive {
        Bound::Included(value.to_string())
    } else {
        Bound::Excluded(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("[1.0,2.0)", vec![Interval::half_open("1.0", "2.0")])]
    #[case("[1.0,)", vec![Interval::at_least("1.0")])]
    #[case("(,2.0)", vec![Interval::less_than("2.0")])]
    #[case("(,2.0]", vec![Interval::at_most("2.0")])]
    #[case("(1.0,)", vec![Interval::greater_than("1.0")])]
    #[case("[1.5]", vec![Interval::exactly("1.5")])]
    #[case("(,)", vec![Interval::full()])]
    #[case(
        "(,1.0], [1.2,)",
        vec![Interval::at_most("1.0"), Interval::at_least("1.2")]
    )]
    fn parse_bracket_groups_accepts_maven_ranges(
        #[case] input: &str,
        #[case] expected: Vec<Interval>,
    ) {
        assert_eq!(parse_bracket_groups(input), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("1.0")]
    #[case("[1.0,2.0")]
    #[case("(1.5)")]
    #[case("[1.0,2.0,3.0]")]
    #[case("[1.0,2.0),")]
    #[case("[1.0,2.0) junk")]
    #[case("[[1.0,2.0)")]
    fn parse_bracket_groups_rejects_malformed_input(#[case] input: &str) {
        assert_eq!(parse_bracket_groups(input), None);
    }

    #[rstest]
    #[case(Interval::half_open("1.0", "2.0"), "1.5", true)]
    #[case(Interval::half_open("1.0", "2.0"), "1.0", true)]
    #[case(Interval::half_open("1.0", "2.0"), "2.0", false)]
    #[case(Interval::greater_than("1.0"), "1.0", false)]
    #[case(Interval::at_most("2.0"), "2.0", true)]
    #[case(Interval::full(), "0.0.1", true)]
    fn interval_contains_honors_inclusivity(
        #[case] interval: Interval,
        #[case] version: &str,
        #[case] expected: bool,
    ) {
        let version = MavenComparator.parse(version).unwrap();
        assert_eq!(interval.contains(&MavenComparator, &version).unwrap(), expected);
    }

    #[rstest]
    #[case(
        Interval::at_least("1.0.0"),
        Interval::less_than("2.0.0"),
        Some(Interval::half_open("1.0.0", "2.0.0"))
    )]
    #[case(
        Interval::greater_than("1.0.0"),
        Interval::at_least("1.0.0"),
        Some(Interval::greater_than("1.0.0"))
    )]
    #[case(
        Interval::at_least("1.0.0"),
        Interval::at_most("1.0.0"),
        Some(Interval::exactly("1.0.0"))
    )]
    #[case(Interval::at_least("2.0.0"), Interval::less_than("1.0.0"), None)]
    #[case(Interval::at_least("1.0.0"), Interval::less_than("1.0.0"), None)]
    fn interval_intersect_keeps_tighter_bounds(
        #[case] a: Interval,
        #[case] b: Interval,
        #[case] expected: Option<Interval>,
    ) {
        assert_eq!(a.intersect(&b, &NpmComparator).unwrap(), expected);
    }

    #[test]
    fn interval_set_intersect_distributes_over_union() {
        let left = IntervalSet::new(vec![
            Interval::half_open("1.0.0", "2.0.0"),
            Interval::half_open("3.0.0", "4.0.0"),
        ]);
        let right = IntervalSet::single(Interval::at_least("1.5.0"));

        let result = left.intersect(&right, &NpmComparator).unwrap();

        assert_eq!(
            result,
            IntervalSet::new(vec![
                Interval::half_open("1.5.0", "2.0.0"),
                Interval::half_open("3.0.0", "4.0.0"),
            ])
        );
    }

    #[rstest]
    #[case(WildcardPattern::new("1.2."), "1.2.5", true)]
    #[case(WildcardPattern::new("1.2."), "1.2", true)]
    #[case(WildcardPattern::new("1.2."), "1.2.5.1", true)]
    #[case(WildcardPattern::new("1.2."), "1.3.0", false)]
    #[case(WildcardPattern::new("1.2."), "1.20.1", false)]
    #[case(WildcardPattern::new("1.2."), "1", false)]
    #[case(WildcardPattern::any(), "9.9.9", true)]
    fn wildcard_matches_prefix_segments(
        #[case] pattern: WildcardPattern,
        #[case] candidate: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(pattern.matches(candidate), expected);
    }

    #[rstest]
    #[case(Constraint::Exact("1.2.3".to_string()), "=1.2.3")]
    #[case(
        Constraint::Intervals(IntervalSet::new(vec![
            Interval::half_open("1.0", "2.0"),
            Interval::greater_than("3.0"),
        ])),
        "[1.0,2.0),(3.0,)"
    )]
    #[case(Constraint::Intervals(IntervalSet::empty()), "none")]
    #[case(Constraint::Intervals(IntervalSet::single(Interval::full())), "(,)")]
    #[case(Constraint::Wildcard(WildcardPattern::new("1.2")), "1.2.+")]
    #[case(Constraint::Wildcard(WildcardPattern::any()), "+")]
    fn canonical_form_round_trips(#[case] constraint: Constraint, #[case] canonical: &str) {
        assert_eq!(constraint.to_string(), canonical);
        assert_eq!(canonical.parse::<Constraint>().unwrap(), constraint);
    }

    #[rstest]
    #[case("=")]
    #[case("1.2.3")]
    #[case("[1.0")]
    fn canonical_form_rejects_non_canonical_text(#[case] input: &str) {
        assert!(input.parse::<Constraint>().is_err());
    }
}
