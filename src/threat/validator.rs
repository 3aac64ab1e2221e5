//! Offline checks for threat files before they are published

use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::ecosystem::{Ecosystem, normalize_ecosystem_id};
use crate::threat::error::DatabaseLoadError;
use crate::threat::index::{is_header, parse_row};
use crate::threat::metadata::ThreatMetadata;

/// Substrings that only appear in version ranges, never in concrete versions
const RANGE_MARKERS: [&str; 10] = ["^", "~", ">", "<", "*", "||", " - ", "[", "(", ".+"];

/// Outcome of validating a threat file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Data rows seen, valid or not
    pub rows: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, line: u64, message: impl std::fmt::Display) {
        self.errors.push(format!("line {line}: {message}"));
    }

    fn warning(&mut self, line: u64, message: impl std::fmt::Display) {
        self.warnings.push(format!("line {line}: {message}"));
    }
}

pub fn validate_threat_file(path: &Path, strict: bool) -> Result<ValidationReport, DatabaseLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatabaseLoadError::io(path, e))?;
    Ok(validate_threat_str(&content, strict))
}

/// Validate threat CSV content
///
/// In strict mode an ecosystem outside npm, maven and pip is an error
/// instead of a warning.
pub fn validate_threat_str(content: &str, strict: bool) -> ValidationReport {
    let mut report = ValidationReport::default();

    let metadata = ThreatMetadata::parse(content);
    for field in metadata.missing_recommended() {
        report
            .warnings
            .push(format!("missing recommended metadata field '{field}'"));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());

    let mut seen = HashSet::new();
    let mut header_seen = false;

    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                report.error(line, e);
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());

        if i == 0 {
            if is_header(&record) {
                header_seen = true;
                check_header(&mut report, line, &record);
                continue;
            }
            report.error(line, "missing header row (expected 'ecosystem,name,version')");
        }

        report.rows += 1;
        let (ecosystem, name, version) = match parse_row(&record) {
            Ok(row) => row,
            Err(message) => {
                report.error(line, message);
                continue;
            }
        };

        let ecosystem_id = normalize_ecosystem_id(&ecosystem);
        match ecosystem_id.parse::<Ecosystem>() {
            Ok(Ecosystem::Maven) if !name.contains(':') => {
                report.warning(line, format!("maven package '{name}' is not groupId:artifactId"));
            }
            Ok(_) => {}
            Err(()) if strict => report.error(line, format!("unknown ecosystem '{ecosystem}'")),
            Err(()) => report.warning(line, format!("unknown ecosystem '{ecosystem}'")),
        }

        if RANGE_MARKERS.iter().any(|marker| version.contains(marker)) {
            report.error(
                line,
                format!("version '{version}' looks like a range; list concrete versions only"),
            );
        }

        if !seen.insert((ecosystem_id, name.clone(), version.clone())) {
            report.warning(line, format!("duplicate entry {name}@{version}"));
        }
    }

    if report.rows == 0 && header_seen {
        report.errors.push("no data rows".to_string());
    } else if report.rows == 0 {
        report.errors.push("file is empty".to_string());
    }

    report
}

fn check_header(report: &mut ValidationReport, line: u64, record: &csv::StringRecord) {
    let columns: Vec<String> = record.iter().map(str::to_ascii_lowercase).collect();
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    match columns.as_slice() {
        ["ecosystem", "name", "version"] => {}
        ["package name", "version"] => report.warning(
            line,
            "legacy header 'Package Name,Version'; rows default to npm",
        ),
        _ => report.error(
            line,
            format!(
                "unrecognized header '{}' (expected 'ecosystem,name,version')",
                record.iter().collect::<Vec<_>>().join(",")
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HEADER: &str = "# Description: d\n# Source: s\n# Last updated: 2025-01-01\n";

    #[test]
    fn well_formed_file_is_valid() {
        let content = format!(
            "{HEADER}ecosystem,name,version\nnpm,left-pad,1.3.0\nmaven,org.example:lib,1.0\npip,requests,2.25.1\n"
        );
        let report = validate_threat_str(&content, true);

        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.rows, 3);
    }

    #[rstest]
    #[case("npm,a,^1.0.0")]
    #[case("npm,a,>=1.0.0")]
    #[case("maven,g:a,\"[1.0,2.0)\"")]
    #[case("maven,g:a,1.2.+")]
    #[case("pip,a,1.*")]
    fn range_versions_are_errors(#[case] row: &str) {
        let report = validate_threat_str(&format!("{HEADER}ecosystem,name,version\n{row}\n"), false);

        assert!(!report.is_valid());
        assert!(report.errors[0].contains("looks like a range"));
    }

    #[rstest]
    #[case(false, true)]
    #[case(true, false)]
    fn unknown_ecosystem_fails_only_in_strict_mode(#[case] strict: bool, #[case] valid: bool) {
        let report = validate_threat_str(
            &format!("{HEADER}ecosystem,name,version\ngem,strong_migrations,0.7.9\n"),
            strict,
        );

        assert_eq!(report.is_valid(), valid);
    }

    #[test]
    fn duplicates_and_bare_maven_names_are_warnings() {
        let report = validate_threat_str(
            &format!("{HEADER}ecosystem,name,version\nnpm,a,1.0.0\nnpm,a,1.0.0\nmaven,log4j,2.14.1\n"),
            true,
        );

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].starts_with("line 6: duplicate"));
        assert!(report.warnings[1].contains("groupId:artifactId"));
    }

    #[test]
    fn legacy_header_and_missing_metadata_are_warnings() {
        let report = validate_threat_str("Package Name,Version\nleft-pad,1.3.0\n", true);

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 4);
    }

    #[rstest]
    #[case("")]
    #[case("ecosystem,name,version\n")]
    #[case("npm,a,1.0.0\n")]
    #[case("ecosystem,name\nnpm,a\n")]
    #[case("ecosystem,name,version\nnpm,,1.0.0\n")]
    fn structural_problems_are_errors(#[case] content: &str) {
        assert!(!validate_threat_str(content, false).is_valid());
    }
}
