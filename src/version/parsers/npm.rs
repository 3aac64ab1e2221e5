//! npm version range parser
//!
//! Supports npm semver range specifications:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact version
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0-0, special cases for 0.x)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0-0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `1.2`, `1`, `*` - x-ranges
//! - `1.2.3 - 2.3.4` - hyphen range
//! - `>=1.0.0 <2.0.0` - space-separated comparators, all must hold
//! - `^1.0.0 || ^2.0.0` - union
//!
//! Synthesized exclusive upper bounds carry the `-0` pre-release floor, so
//! `^1.2.3` keeps `2.0.0-beta` out of range.

use crate::ecosystem::Ecosystem;
use crate::version::comparator::VersionComparator;
use crate::version::comparators::NpmComparator;
use crate::version::comparators::npm::normalize_version;
use crate::version::constraint::{Constraint, Interval, IntervalSet};
use crate::version::error::ConstraintParseError;
use crate::version::parser::ConstraintParser;

pub struct NpmConstraintParser;

/// A version that may leave trailing components unspecified (`1`, `1.2`, `1.x`)
#[derive(Debug, Clone, PartialEq, Eq)]
struct PartialVersion {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    /// Pre-release including its leading `-`, only kept for full versions
    prerelease: String,
}

impl PartialVersion {
    fn parse(raw: &str) -> Option<Self> {
        let version = normalize_version(raw);
        if version.is_empty() {
            return None;
        }
        let version = version.split_once('+').map_or(version, |(core, _)| core);
        let (core, prerelease) = match version.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, format!("-{pre}")),
            Some(_) => return None,
            None => (version, String::new()),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return None;
        }

        let mut numbers = [None; 3];
        let mut wildcard_seen = false;
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if matches!(*part, "x" | "X" | "*") {
                wildcard_seen = true;
                continue;
            }
            if wildcard_seen || part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            *slot = Some(part.parse::<u64>().ok()?);
        }

        let [major, minor, patch] = numbers;
        let partial = Self {
            major,
            minor,
            patch,
            prerelease: if patch.is_some() {
                prerelease
            } else {
                String::new()
            },
        };
        if !partial.prerelease.is_empty() {
            NpmComparator.parse(&partial.floor()).ok()?;
        }
        Some(partial)
    }

    fn is_full(&self) -> bool {
        self.patch.is_some()
    }

    fn is_any(&self) -> bool {
        self.major.is_none()
    }

    /// Lowest version matched by the x-range (`1.2` -> `1.2.0`)
    fn floor(&self) -> String {
        format!(
            "{}.{}.{}{}",
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
            self.prerelease
        )
    }

    /// First version past the x-range, as an exclusive `-0` bound (`1.2` -> `1.3.0-0`)
    ///
    /// `None` when the bumped component does not fit in a `u64`.
    fn ceiling(&self) -> Option<String> {
        Some(match (self.major, self.minor) {
            (Some(major), None) => format!("{}.0.0-0", major.checked_add(1)?),
            (Some(major), Some(minor)) => format!("{major}.{}.0-0", minor.checked_add(1)?),
            (None, _) => "0.0.0-0".to_string(),
        })
    }

    /// The x-range itself: `1.2` -> `[1.2.0, 1.3.0-0)`
    fn x_range(&self) -> Option<Interval> {
        Some(if self.is_any() {
            Interval::full()
        } else if self.is_full() {
            Interval::exactly(&self.floor())
        } else {
            Interval::half_open(&self.floor(), &self.ceiling()?)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
    Caret,
    Tilde,
}

/// Split a leading operator off a comparator token
fn split_operator(token: &str) -> (Option<Operator>, &str) {
    const OPERATORS: &[(&str, Operator)] = &[
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        ("~>", Operator::Tilde),
        (">", Operator::Gt),
        ("<", Operator::Lt),
        ("=", Operator::Eq),
        ("^", Operator::Caret),
        ("~", Operator::Tilde),
    ];
    for (symbol, operator) in OPERATORS {
        if let Some(rest) = token.strip_prefix(symbol) {
            return (Some(*operator), rest.trim_start());
        }
    }
    (None, token)
}

fn caret_interval(version: &PartialVersion) -> Option<Interval> {
    let upper = match (version.major, version.minor, version.patch) {
        (None, _, _) => return Some(Interval::full()),
        (Some(major), None, _) => format!("{}.0.0-0", major.checked_add(1)?),
        (Some(0), Some(0), Some(patch)) => format!("0.0.{}-0", patch.checked_add(1)?),
        (Some(0), Some(minor), _) => format!("0.{}.0-0", minor.checked_add(1)?),
        (Some(major), Some(_), _) => format!("{}.0.0-0", major.checked_add(1)?),
    };
    Some(Interval::half_open(&version.floor(), &upper))
}

fn tilde_interval(version: &PartialVersion) -> Option<Interval> {
    if version.is_any() {
        return Some(Interval::full());
    }
    Some(Interval::half_open(&version.floor(), &version.ceiling()?))
}

/// Interval for one primitive comparator such as `>=1.2` or `^0.2.3`
///
/// `None` when a synthesized bound overflows.
fn comparator_interval(operator: Option<Operator>, version: &PartialVersion) -> Option<IntervalSet> {
    let interval = match operator {
        None | Some(Operator::Eq) => version.x_range()?,
        Some(Operator::Caret) => caret_interval(version)?,
        Some(Operator::Tilde) => tilde_interval(version)?,
        Some(Operator::Gte) if version.is_any() => Interval::full(),
        Some(Operator::Lte) if version.is_any() => Interval::full(),
        Some(Operator::Gt | Operator::Lt) if version.is_any() => return Some(IntervalSet::empty()),
        Some(Operator::Gte) => Interval::at_least(&version.floor()),
        Some(Operator::Gt) if version.is_full() => Interval::greater_than(&version.floor()),
        Some(Operator::Gt) => Interval::at_least(&version.ceiling()?),
        Some(Operator::Lt) if version.is_full() => Interval::less_than(&version.floor()),
        Some(Operator::Lt) => Interval::less_than(&format!("{}-0", version.floor())),
        Some(Operator::Lte) if version.is_full() => Interval::at_most(&version.floor()),
        Some(Operator::Lte) => Interval::less_than(&version.ceiling()?),
    };
    Some(IntervalSet::single(interval))
}

/// Hyphen range: `1.2.3 - 2.3.4` is closed, a partial upper end covers its x-range
fn hyphen_interval(from: &PartialVersion, to: &PartialVersion) -> Option<Interval> {
    let lower = if from.is_any() {
        Interval::full().lower
    } else {
        Interval::at_least(&from.floor()).lower
    };
    let upper = if to.is_any() {
        Interval::full().upper
    } else if to.is_full() {
        Interval::at_most(&to.floor()).upper
    } else {
        Interval::less_than(&to.ceiling()?).upper
    };
    Some(Interval::new(lower, upper))
}

/// Split a comparator set into tokens, joining operators written apart (`>= 1.2.3`)
fn split_comparators(spec: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_operator = String::new();
    for word in spec.split_whitespace() {
        if word.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
            pending_operator.push_str(word);
            continue;
        }
        tokens.push(format!("{pending_operator}{word}"));
        pending_operator.clear();
    }
    if !pending_operator.is_empty() {
        tokens.push(pending_operator);
    }
    tokens
}

impl NpmConstraintParser {
    fn error(raw: &str, reason: impl Into<String>) -> ConstraintParseError {
        ConstraintParseError::new(Ecosystem::Npm, raw, reason)
    }

    /// Parse one `||`-separated branch into an interval set
    fn parse_branch(raw: &str, branch: &str) -> Result<IntervalSet, ConstraintParseError> {
        let branch = branch.trim();
        if branch.is_empty() {
            return Ok(IntervalSet::single(Interval::full()));
        }

        if let Some((from_raw, to_raw)) = branch.split_once(" - ") {
            let from = PartialVersion::parse(from_raw)
                .ok_or_else(|| Self::error(raw, format!("invalid hyphen range start '{from_raw}'")))?;
            let to = PartialVersion::parse(to_raw)
                .ok_or_else(|| Self::error(raw, format!("invalid hyphen range end '{to_raw}'")))?;
            let interval = hyphen_interval(&from, &to)
                .ok_or_else(|| Self::error(raw, format!("hyphen range end '{to_raw}' out of range")))?;
            let empty = interval
                .is_empty(&NpmComparator)
                .map_err(ConstraintParseError::from)?;
            return Ok(if empty {
                IntervalSet::empty()
            } else {
                IntervalSet::single(interval)
            });
        }

        let mut result = IntervalSet::single(Interval::full());
        for token in split_comparators(branch) {
            let (operator, version) = split_operator(&token);
            let version = PartialVersion::parse(version)
                .ok_or_else(|| Self::error(raw, format!("invalid comparator '{token}'")))?;
            let interval = comparator_interval(operator, &version)
                .ok_or_else(|| Self::error(raw, format!("version out of range in '{token}'")))?;
            result = result.intersect(&interval, &NpmComparator)?;
        }
        Ok(result)
    }
}

impl ConstraintParser for NpmConstraintParser {
    fn parse(&self, raw: &str) -> Result<Constraint, ConstraintParseError> {
        let spec = raw.trim();

        // A single full version with no operator (or a bare `=`) is a literal
        let branches: Vec<&str> = spec.split("||").collect();
        if let [single] = branches.as_slice()
            && !single.trim().contains(char::is_whitespace)
        {
            let (operator, version) = split_operator(single.trim());
            if matches!(operator, None | Some(Operator::Eq))
                && let Some(partial) = PartialVersion::parse(version)
                && partial.is_full()
            {
                return Ok(Constraint::Exact(NpmComparator.normalize(version)));
            }
        }

        let mut set = IntervalSet::empty();
        for branch in branches {
            set = set.union(Self::parse_branch(raw, branch)?);
        }
        Ok(Constraint::Intervals(set))
    }
}
