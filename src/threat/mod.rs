//! Compromised-version database
//!
//! Threat files are CSV with one concrete compromised version per row,
//! optionally preceded by `# Key: value` metadata comments:
//!
//! ```text
//! # Description: Shai-Hulud npm worm
//! # Source: https://example.com/advisory
//! ecosystem,name,version
//! npm,left-pad,1.3.0
//! maven,org.apache.logging.log4j:log4j-core,2.14.1
//! ```
//!
//! # Modules
//!
//! - [`index`]: Loads and indexes rows by ecosystem and canonical package name
//! - [`metadata`]: Metadata comment parsing
//! - [`validator`]: Offline checks for threat files
//! - [`error`]: Fatal load errors

pub mod error;
pub mod index;
pub mod metadata;
pub mod validator;

pub use error::DatabaseLoadError;
pub use index::{EcosystemSummary, IndexSummary, LoadWarning, ThreatIndex};
pub use metadata::ThreatMetadata;
pub use validator::{ValidationReport, validate_threat_file, validate_threat_str};
