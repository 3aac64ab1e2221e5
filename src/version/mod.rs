//! Version layer for compromised-version matching
//!
//! This module turns declared dependency versions into ecosystem-aware
//! constraints and compares concrete versions against them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Parser    │────▶│ Constraint  │◀────│ Comparator  │
//! │ (declared)  │     │ (intervals) │     │  (ordering) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │   Parsers   │                         │ Comparators │
//! │(npm,mvn,pip)│                         │(npm,mvn,pip)│
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`comparator`]: Version ordering trait
//! - [`comparators`]: semver, Maven ComparableVersion and PEP 440 orderings
//! - [`constraint`]: Normalized constraint model and its canonical string form
//! - [`parser`]: Declared-version grammar trait
//! - [`parsers`]: npm, Maven/Gradle and pip/Poetry grammars
//! - [`error`]: Parse error types

pub mod comparator;
pub mod comparators;
pub mod constraint;
pub mod error;
pub mod parser;
pub mod parsers;
