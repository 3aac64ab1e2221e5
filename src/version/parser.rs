//! Declared-version parsing abstraction for different ecosystems

use crate::version::constraint::Constraint;
use crate::version::error::ConstraintParseError;

/// Trait for ecosystem-specific constraint grammars
///
/// Each ecosystem writes ranges differently:
/// - npm: `^1.2.3`, `~1.2.3`, `>=1.0.0 <2.0.0`, `1.2.x`, `1.0.0 - 2.0.0`, `||`
/// - Maven/Gradle: `[1.0,2.0)`, `(,1.0],[1.2,)`, `1.2.+`
/// - pip/Poetry: `>=1.0,<2.0`, `~=2.2`, `^1.2`, `~1.2`
pub trait ConstraintParser {
    /// Parse a raw declared-version string into a normalized constraint
    fn parse(&self, raw: &str) -> Result<Constraint, ConstraintParseError>;
}
