//! Maven / Gradle version range parser
//!
//! Supports:
//! - `1.2.3` - soft requirement, matched as the literal version only
//! - `[1.0,2.0)`, `(1.0,2.0]`, `[1.0,)`, `(,2.0)`, `[1.5]` - bracket ranges
//! - `(,1.0],[1.2,)` - union of bracket ranges
//! - `1.2.+`, `1.2+`, `+`, `latest.release` - Gradle dynamic versions
//! - `1.2.3!!` - Gradle strict version, matched as the literal version
//!
//! A bare version is what Maven calls a recommendation: a resolver may pick
//! something newer. Only the declared literal is checked against threats.

use std::ops::Bound;

use crate::ecosystem::Ecosystem;
use crate::version::comparator::VersionComparator;
use crate::version::comparators::MavenComparator;
use crate::version::constraint::{
    Constraint, IntervalSet, WildcardPattern, parse_bracket_groups,
};
use crate::version::error::ConstraintParseError;
use crate::version::parser::ConstraintParser;

pub struct MavenConstraintParser;

impl MavenConstraintParser {
    fn error(raw: &str, reason: impl Into<String>) -> ConstraintParseError {
        ConstraintParseError::new(Ecosystem::Maven, raw, reason)
    }

    fn parse_ranges(raw: &str, spec: &str) -> Result<Constraint, ConstraintParseError> {
        let intervals = parse_bracket_groups(spec)
            .ok_or_else(|| Self::error(raw, "malformed bracket range"))?;

        for interval in &intervals {
            for bound in [&interval.lower, &interval.upper] {
                if let Bound::Included(v) | Bound::Excluded(v) = bound {
                    MavenComparator
                        .parse(v)
                        .map_err(|e| Self::error(raw, e.reason))?;
                }
            }
            let empty = interval
                .is_empty(&MavenComparator)
                .map_err(|e| Self::error(raw, e.reason))?;
            if empty {
                return Err(Self::error(
                    raw,
                    format!("range {interval} defies version ordering"),
                ));
            }
        }

        Ok(Constraint::Intervals(IntervalSet::new(intervals)))
    }

    fn parse_dynamic(raw: &str, prefix: &str) -> Result<Constraint, ConstraintParseError> {
        let prefix = prefix.strip_suffix('.').unwrap_or(prefix);
        if prefix.is_empty() {
            return Ok(Constraint::Wildcard(WildcardPattern::any()));
        }
        if prefix.split('.').any(|segment| {
            segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        }) {
            return Err(Self::error(raw, format!("invalid dynamic version prefix '{prefix}'")));
        }
        Ok(Constraint::Wildcard(WildcardPattern::new(prefix)))
    }
}

impl ConstraintParser for MavenConstraintParser {
    fn parse(&self, raw: &str) -> Result<Constraint, ConstraintParseError> {
        let spec = raw.trim();
        if spec.is_empty() {
            return Err(Self::error(raw, "empty version"));
        }

        if spec.starts_with(['[', '(']) {
            return Self::parse_ranges(raw, spec);
        }

        if matches!(spec, "latest.release" | "latest.integration") {
            return Ok(Constraint::Wildcard(WildcardPattern::any()));
        }

        if let Some(prefix) = spec.strip_suffix('+') {
            return Self::parse_dynamic(raw, prefix);
        }

        let literal = spec.strip_suffix("!!").unwrap_or(spec).trim();
        if literal.contains("${") {
            return Err(Self::error(raw, "unresolved property placeholder"));
        }
        MavenComparator
            .parse(literal)
            .map_err(|e| Self::error(raw, e.reason))?;
        Ok(Constraint::Exact(literal.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::constraint::Interval;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", "1.2.3")]
    #[case(" 2.14.1 ", "2.14.1")]
    #[case("1.0-SNAPSHOT", "1.0-SNAPSHOT")]
    #[case("1.2.3!!", "1.2.3")]
    fn parse_bare_version_is_exact(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(
            MavenConstraintParser.parse(raw).unwrap(),
            Constraint::Exact(expected.to_string())
        );
    }

    #[rstest]
    #[case("[1.0,2.0)", vec![Interval::half_open("1.0", "2.0")])]
    #[case("[1.0,2.0]", vec![Interval::closed("1.0", "2.0")])]
    #[case("(1.0,2.0)", vec![Interval::new(
        Bound::Excluded("1.0".to_string()),
        Bound::Excluded("2.0".to_string()),
    )])]
    #[case("[1.0,)", vec![Interval::at_least("1.0")])]
    #[case("(,2.0)", vec![Interval::less_than("2.0")])]
    #[case("[1.5]", vec![Interval::exactly("1.5")])]
    #[case(
        "(,1.0],[1.2,)",
        vec![Interval::at_most("1.0"), Interval::at_least("1.2")]
    )]
    fn parse_bracket_ranges(#[case] raw: &str, #[case] expected: Vec<Interval>) {
        assert_eq!(
            MavenConstraintParser.parse(raw).unwrap(),
            Constraint::Intervals(IntervalSet::new(expected))
        );
    }

    #[rstest]
    #[case("1.2.+", WildcardPattern::new("1.2"))]
    #[case("1.+", WildcardPattern::new("1"))]
    #[case("1.2+", WildcardPattern::new("1.2"))]
    #[case("+", WildcardPattern::any())]
    #[case("latest.release", WildcardPattern::any())]
    #[case("latest.integration", WildcardPattern::any())]
    fn parse_gradle_dynamic_versions(#[case] raw: &str, #[case] expected: WildcardPattern) {
        assert_eq!(
            MavenConstraintParser.parse(raw).unwrap(),
            Constraint::Wildcard(expected)
        );
    }

    #[rstest]
    #[case("")]
    #[case("[2.0,1.0]")]
    #[case("[1.0,2.0")]
    #[case("[abc,2.0)")]
    #[case("${log4j.version}")]
    #[case("1..+")]
    #[case("RELEASE")]
    fn parse_rejects_malformed_specs(#[case] raw: &str) {
        let err = MavenConstraintParser.parse(raw).unwrap_err();
        assert_eq!(err.ecosystem, Ecosystem::Maven);
    }
}
