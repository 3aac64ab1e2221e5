//! Ecosystem identifiers and package name canonicalization

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::version::comparator::VersionComparator;
use crate::version::comparators::{MavenComparator, NpmComparator, PypiComparator};
use crate::version::constraint::Constraint;
use crate::version::error::{ConstraintParseError, VersionParseError};
use crate::version::parser::ConstraintParser;
use crate::version::parsers::{MavenConstraintParser, NpmConstraintParser, PypiConstraintParser};

/// Package ecosystem with its own version grammar and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// npm registry (package.json, package-lock.json)
    Npm,
    /// Maven Central artifacts, declared from pom.xml or Gradle build files
    Maven,
    /// Python packages (requirements.txt, pyproject.toml, Pipfile)
    Pip,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 3] = [Ecosystem::Npm, Ecosystem::Maven, Ecosystem::Pip];

    /// Returns the identifier used in threat databases
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Maven => "maven",
            Ecosystem::Pip => "pip",
        }
    }

    /// Canonical form of a package name, used as the index key
    ///
    /// - npm: verbatim, scope prefix included (`@babel/core`)
    /// - Maven: `groupId:artifactId` verbatim, case-sensitive
    /// - pip: PEP 503 normalized (`Foo_Bar.baz` -> `foo-bar-baz`)
    pub fn canonical_package_name(&self, name: &str) -> String {
        let name = name.trim();
        match self {
            Ecosystem::Npm | Ecosystem::Maven => name.to_string(),
            Ecosystem::Pip => PEP503_SEPARATORS
                .replace_all(&name.to_lowercase(), "-")
                .into_owned(),
        }
    }

    /// Total order between two concrete versions of this ecosystem
    pub fn compare_versions(&self, a: &str, b: &str) -> Result<Ordering, VersionParseError> {
        match self {
            Ecosystem::Npm => NpmComparator.compare(a, b),
            Ecosystem::Maven => MavenComparator.compare(a, b),
            Ecosystem::Pip => PypiComparator.compare(a, b),
        }
    }

    /// Normalized form of a concrete version literal, used for exact matching
    pub fn normalize_version(&self, raw: &str) -> String {
        match self {
            Ecosystem::Npm => NpmComparator.normalize(raw),
            Ecosystem::Maven => MavenComparator.normalize(raw),
            Ecosystem::Pip => PypiComparator.normalize(raw),
        }
    }

    /// Parse a declared version expression with this ecosystem's grammar
    pub fn parse_constraint(&self, raw: &str) -> Result<Constraint, ConstraintParseError> {
        match self {
            Ecosystem::Npm => NpmConstraintParser.parse(raw),
            Ecosystem::Maven => MavenConstraintParser.parse(raw),
            Ecosystem::Pip => PypiConstraintParser.parse(raw),
        }
    }
}

static PEP503_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("valid separator regex"));

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(Ecosystem::Npm),
            "maven" | "gradle" => Ok(Ecosystem::Maven),
            "pip" | "pypi" | "python" | "poetry" => Ok(Ecosystem::Pip),
            _ => Err(()),
        }
    }
}

/// Normalize an ecosystem identifier as found in a threat database row
///
/// Known aliases collapse to the canonical identifier; anything else is
/// kept lowercased so unmodeled ecosystems (e.g. `gem`) survive loading.
pub fn normalize_ecosystem_id(raw: &str) -> String {
    match raw.parse::<Ecosystem>() {
        Ok(ecosystem) => ecosystem.as_str().to_string(),
        Err(()) => raw.trim().to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("npm", Ok(Ecosystem::Npm))]
    #[case("NPM", Ok(Ecosystem::Npm))]
    #[case("maven", Ok(Ecosystem::Maven))]
    #[case("gradle", Ok(Ecosystem::Maven))]
    #[case("pip", Ok(Ecosystem::Pip))]
    #[case(" PyPI ", Ok(Ecosystem::Pip))]
    #[case("python", Ok(Ecosystem::Pip))]
    #[case("gem", Err(()))]
    #[case("", Err(()))]
    fn from_str_returns_expected(#[case] input: &str, #[case] expected: Result<Ecosystem, ()>) {
        assert_eq!(input.parse::<Ecosystem>(), expected);
    }

    #[rstest]
    #[case(Ecosystem::Npm, "@Babel/Core", "@Babel/Core")]
    #[case(Ecosystem::Npm, " left-pad ", "left-pad")]
    #[case(
        Ecosystem::Maven,
        "org.apache.logging.log4j:log4j-core",
        "org.apache.logging.log4j:log4j-core"
    )]
    #[case(Ecosystem::Maven, "Org.Example:Lib", "Org.Example:Lib")]
    #[case(Ecosystem::Pip, "Requests", "requests")]
    #[case(Ecosystem::Pip, "Foo_Bar.baz", "foo-bar-baz")]
    #[case(Ecosystem::Pip, "zope.__interface", "zope-interface")]
    fn canonical_package_name_follows_ecosystem_rules(
        #[case] ecosystem: Ecosystem,
        #[case] name: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(ecosystem.canonical_package_name(name), expected);
    }

    #[rstest]
    #[case("Gradle", "maven")]
    #[case("pypi", "pip")]
    #[case(" GEM ", "gem")]
    #[case("cargo", "cargo")]
    fn normalize_ecosystem_id_collapses_aliases(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_ecosystem_id(raw), expected);
    }
}
