//! Matching declared dependencies against the threat index

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::ecosystem::Ecosystem;
use crate::threat::ThreatIndex;
use crate::version::constraint::Constraint;

/// How a compromised version was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// The declared version is the compromised literal
    Exact,
    /// The compromised version falls inside a declared range or wildcard
    Range,
}

/// Trust in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    /// The declared version could not be parsed and was compared verbatim
    Low,
}

/// One compromised version covered by one declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub ecosystem: Ecosystem,
    /// Canonical package name
    pub package_name: String,
    /// Declared version expression as written
    pub declared_spec: String,
    pub matched_version: String,
    pub match_type: MatchType,
    pub confidence: Confidence,
}

/// A dependency as extracted from a manifest or lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependency {
    pub ecosystem: String,
    pub name: String,
    pub spec: String,
}

impl DeclaredDependency {
    pub fn new(ecosystem: &str, name: &str, spec: &str) -> Self {
        Self {
            ecosystem: ecosystem.to_string(),
            name: name.to_string(),
            spec: spec.to_string(),
        }
    }
}

/// Evaluates declared dependencies against an immutable [`ThreatIndex`]
///
/// Evaluation has no side effects beyond logging, so one engine can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct MatchEngine<'a> {
    index: &'a ThreatIndex,
    config: ScanConfig,
}

impl<'a> MatchEngine<'a> {
    pub fn new(index: &'a ThreatIndex) -> Self {
        Self::with_config(index, ScanConfig::default())
    }

    pub fn with_config(index: &'a ThreatIndex, config: ScanConfig) -> Self {
        Self { index, config }
    }

    /// Every compromised version of the package that the declared spec admits
    ///
    /// Unknown and disabled ecosystems produce no matches.
    pub fn evaluate(&self, ecosystem: &str, package_name: &str, declared_spec: &str) -> Vec<MatchResult> {
        let Ok(ecosystem) = ecosystem.parse::<Ecosystem>() else {
            debug!("No matcher for ecosystem '{}'", ecosystem);
            return Vec::new();
        };
        if !self.config.is_enabled(ecosystem) {
            debug!("Ecosystem {} is disabled", ecosystem);
            return Vec::new();
        }

        let package_name = ecosystem.canonical_package_name(package_name);
        let candidates = self
            .index
            .get_compromised_versions(ecosystem.as_str(), &package_name);
        if candidates.is_empty() {
            return Vec::new();
        }

        let Some((constraint, confidence)) = self.constraint_for(ecosystem, declared_spec) else {
            return Vec::new();
        };

        candidates
            .iter()
            .filter_map(|candidate| {
                let match_type = match_type_for(ecosystem, &constraint, declared_spec, candidate)?;
                debug!(
                    "{} {}@{} covers compromised {}",
                    ecosystem, package_name, declared_spec, candidate
                );
                Some(MatchResult {
                    ecosystem,
                    package_name: package_name.clone(),
                    declared_spec: declared_spec.to_string(),
                    matched_version: candidate.clone(),
                    match_type,
                    confidence,
                })
            })
            .collect()
    }

    /// Evaluate many dependencies, sorted by ecosystem, package, spec and version
    pub fn evaluate_all<'d, I>(&self, dependencies: I) -> Vec<MatchResult>
    where
        I: IntoIterator<Item = &'d DeclaredDependency>,
    {
        let mut results: Vec<MatchResult> = dependencies
            .into_iter()
            .flat_map(|dep| self.evaluate(&dep.ecosystem, &dep.name, &dep.spec))
            .collect();
        results.sort_by(result_order);
        results
    }

    fn constraint_for(&self, ecosystem: Ecosystem, declared_spec: &str) -> Option<(Constraint, Confidence)> {
        match ecosystem.parse_constraint(declared_spec) {
            Ok(constraint) => Some((constraint, Confidence::High)),
            Err(e) if self.config.fallback.exact_on_parse_error => {
                warn!("{}; comparing it as an exact version", e);
                Some((
                    Constraint::Exact(declared_spec.trim().to_string()),
                    Confidence::Low,
                ))
            }
            Err(e) => {
                warn!("{}; skipping", e);
                None
            }
        }
    }
}

fn result_order(a: &MatchResult, b: &MatchResult) -> Ordering {
    a.ecosystem
        .cmp(&b.ecosystem)
        .then_with(|| a.package_name.cmp(&b.package_name))
        .then_with(|| a.declared_spec.cmp(&b.declared_spec))
        .then_with(|| {
            a.ecosystem
                .compare_versions(&a.matched_version, &b.matched_version)
                .unwrap_or_else(|_| a.matched_version.cmp(&b.matched_version))
        })
}

fn match_type_for(
    ecosystem: Ecosystem,
    constraint: &Constraint,
    declared_spec: &str,
    candidate: &str,
) -> Option<MatchType> {
    let covered = match constraint {
        Constraint::Exact(literal) => {
            return (ecosystem.normalize_version(literal) == ecosystem.normalize_version(candidate))
                .then_some(MatchType::Exact);
        }
        // npm `1.2` parses as an x-range yet still names a `1.2` row verbatim
        _ if ecosystem.normalize_version(declared_spec) == ecosystem.normalize_version(candidate) => {
            return Some(MatchType::Exact);
        }
        Constraint::Intervals(set) => match set.contains_version(ecosystem, candidate) {
            Ok(covered) => covered,
            Err(e) => {
                debug!("Excluding compromised version from comparison: {}", e);
                false
            }
        },
        Constraint::Wildcard(pattern) => pattern.matches(candidate),
    };
    covered.then_some(MatchType::Range)
}
