//! Ecosystem-specific constraint parsers

pub mod maven;
pub mod npm;
pub mod pypi;

pub use maven::MavenConstraintParser;
pub use npm::NpmConstraintParser;
pub use pypi::PypiConstraintParser;
