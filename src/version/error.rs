use thiserror::Error;

use crate::ecosystem::Ecosystem;

/// A concrete version literal that the ecosystem's ordering cannot place
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {ecosystem} version '{input}': {reason}")]
pub struct VersionParseError {
    pub ecosystem: Ecosystem,
    pub input: String,
    pub reason: String,
}

impl VersionParseError {
    pub fn new(ecosystem: Ecosystem, input: &str, reason: impl Into<String>) -> Self {
        Self {
            ecosystem,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A declared version expression that matches no grammar of its ecosystem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {ecosystem} version constraint '{input}': {reason}")]
pub struct ConstraintParseError {
    pub ecosystem: Ecosystem,
    pub input: String,
    pub reason: String,
}

impl ConstraintParseError {
    pub fn new(ecosystem: Ecosystem, input: &str, reason: impl Into<String>) -> Self {
        Self {
            ecosystem,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<VersionParseError> for ConstraintParseError {
    fn from(err: VersionParseError) -> Self {
        Self {
            ecosystem: err.ecosystem,
            input: err.input,
            reason: err.reason,
        }
    }
}
