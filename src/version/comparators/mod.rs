//! Ecosystem-specific version comparators

pub mod maven;
pub mod npm;
pub mod pypi;

pub use maven::MavenComparator;
pub use npm::NpmComparator;
pub use pypi::PypiComparator;
