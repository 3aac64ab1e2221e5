//! Detects declared dependencies that can resolve to known-compromised
//! package versions across npm, Maven/Gradle and pip/Poetry.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use package_scan::{MatchEngine, ThreatIndex};
//!
//! let index = ThreatIndex::load_path(Path::new("threats/shai-hulud.csv"))?;
//! for found in MatchEngine::new(&index).evaluate("npm", "@ctrl/tinycolor", "^4.1.0") {
//!     println!("{} {}", found.package_name, found.matched_version);
//! }
//! # Ok::<(), package_scan::threat::DatabaseLoadError>(())
//! ```

pub mod config;
pub mod ecosystem;
pub mod engine;
pub mod threat;
pub mod version;

pub use config::ScanConfig;
pub use ecosystem::Ecosystem;
pub use engine::{Confidence, DeclaredDependency, MatchEngine, MatchResult, MatchType};
pub use threat::ThreatIndex;
pub use version::constraint::Constraint;
