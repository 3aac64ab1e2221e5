//! In-memory index of compromised package versions

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ecosystem::{Ecosystem, normalize_ecosystem_id};
use crate::threat::error::DatabaseLoadError;
use crate::threat::metadata::ThreatMetadata;

/// First-column values that mark a header row, compared case-insensitively
const HEADER_TOKENS: [&str; 4] = ["ecosystem", "package name", "name", "package"];

static NO_VERSIONS: BTreeSet<String> = BTreeSet::new();

/// A row that was skipped while loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub source: String,
    /// 1-based line number in the source
    pub line: u64,
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source, self.line, self.message)
    }
}

/// Package and version counts for one ecosystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EcosystemSummary {
    pub ecosystem: String,
    pub packages: usize,
    pub versions: usize,
}

/// Totals over the whole index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub threats: Vec<String>,
    pub packages: usize,
    pub versions: usize,
    pub ecosystems: Vec<EcosystemSummary>,
}

/// Compromised versions keyed by ecosystem identifier and canonical package name
///
/// Built once from one or more CSV sources and read-only afterwards.
/// Ecosystems this crate does not model (e.g. `gem`) are kept as loaded so
/// that statistics stay faithful to the source.
#[derive(Debug, Clone, Default)]
pub struct ThreatIndex {
    threats: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    loaded_threats: Vec<String>,
    metadata: IndexMap<String, ThreatMetadata>,
    warnings: Vec<LoadWarning>,
}

impl ThreatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a single CSV source
    pub fn load<R: Read>(mut reader: R, source_name: &str) -> Result<Self, DatabaseLoadError> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| DatabaseLoadError::io(source_name, e))?;
        Self::from_csv_str(&content, source_name)
    }

    pub fn from_csv_str(content: &str, source_name: &str) -> Result<Self, DatabaseLoadError> {
        let mut index = Self::new();
        index.ingest(content, source_name)?;
        index.log_loaded();
        Ok(index)
    }

    /// Load a CSV file; the threat name is the file stem
    pub fn load_path(path: &Path) -> Result<Self, DatabaseLoadError> {
        let mut index = Self::new();
        index.ingest_path(path)?;
        index.log_loaded();
        Ok(index)
    }

    /// Load threat files from a directory
    ///
    /// With `threat_names`, loads `<dir>/<name>.csv` for each name in order.
    /// Without, loads every `*.csv` in the directory sorted by file name.
    pub fn load_dir(
        dir: &Path,
        threat_names: Option<&[String]>,
    ) -> Result<Self, DatabaseLoadError> {
        let paths = match threat_names {
            Some(names) => names
                .iter()
                .map(|name| {
                    let path = dir.join(format!("{name}.csv"));
                    if path.is_file() {
                        Ok(path)
                    } else {
                        Err(DatabaseLoadError::UnknownThreat {
                            name: name.clone(),
                            dir: dir.to_path_buf(),
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                let entries =
                    std::fs::read_dir(dir).map_err(|e| DatabaseLoadError::io(dir, e))?;
                let mut paths = Vec::new();
                for entry in entries {
                    let path = entry.map_err(|e| DatabaseLoadError::io(dir, e))?.path();
                    if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
                        paths.push(path);
                    }
                }
                paths.sort();
                paths
            }
        };

        if paths.is_empty() {
            return Err(DatabaseLoadError::EmptyDirectory {
                dir: dir.to_path_buf(),
            });
        }

        let mut index = Self::new();
        for path in &paths {
            index.ingest_path(path)?;
        }
        index.log_loaded();
        Ok(index)
    }

    fn ingest_path(&mut self, path: &Path) -> Result<(), DatabaseLoadError> {
        debug!("Loading threat file: {}", path.display());
        let content =
            std::fs::read_to_string(path).map_err(|e| DatabaseLoadError::io(path, e))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest(&content, &name)
    }

    fn ingest(&mut self, content: &str, source_name: &str) -> Result<(), DatabaseLoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(content.as_bytes());

        let mut rows = 0usize;
        let mut first = true;

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    let line = e.position().map_or(0, |p| p.line());
                    self.warn_row(source_name, line, format!("unreadable row: {e}"));
                    continue;
                }
            };
            let line = record.position().map_or(0, |p| p.line());

            if std::mem::take(&mut first) && is_header(&record) {
                continue;
            }
            if record.iter().all(str::is_empty) {
                continue;
            }

            match parse_row(&record) {
                Ok((ecosystem, name, version)) => {
                    self.insert(&ecosystem, &name, &version);
                    rows += 1;
                }
                Err(message) => self.warn_row(source_name, line, message),
            }
        }

        if rows == 0 {
            return Err(DatabaseLoadError::NoRows {
                source_name: source_name.to_string(),
            });
        }

        debug!("Loaded {} rows from {}", rows, source_name);
        self.loaded_threats.push(source_name.to_string());
        self.metadata
            .insert(source_name.to_string(), ThreatMetadata::parse(content));
        Ok(())
    }

    fn insert(&mut self, ecosystem: &str, name: &str, version: &str) {
        let ecosystem = normalize_ecosystem_id(ecosystem);
        let name = canonical_name(&ecosystem, name);
        self.threats
            .entry(ecosystem)
            .or_default()
            .entry(name)
            .or_default()
            .insert(version.to_string());
    }

    fn warn_row(&mut self, source: &str, line: u64, message: String) {
        warn!("Skipping {}:{}: {}", source, line, message);
        self.warnings.push(LoadWarning {
            source: source.to_string(),
            line,
            message,
        });
    }

    fn log_loaded(&self) {
        info!(
            "Loaded threat database: {} packages, {} versions",
            self.package_count(None),
            self.version_count(None)
        );
    }

    /// Compromised versions of a package; empty when the package is unknown
    pub fn get_compromised_versions(&self, ecosystem: &str, package: &str) -> &BTreeSet<String> {
        let ecosystem = normalize_ecosystem_id(ecosystem);
        self.threats
            .get(&ecosystem)
            .and_then(|packages| packages.get(&canonical_name(&ecosystem, package)))
            .unwrap_or(&NO_VERSIONS)
    }

    /// Literal membership check, without any range interpretation
    pub fn is_compromised(&self, ecosystem: &str, package: &str, version: &str) -> bool {
        self.get_compromised_versions(ecosystem, package)
            .contains(version.trim())
    }

    /// Every `(ecosystem, package)` pair, sorted
    pub fn get_all_packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.threats.iter().flat_map(|(ecosystem, packages)| {
            packages
                .keys()
                .map(move |package| (ecosystem.as_str(), package.as_str()))
        })
    }

    pub fn get_ecosystems(&self) -> BTreeSet<&str> {
        self.threats.keys().map(String::as_str).collect()
    }

    pub fn package_count(&self, ecosystem: Option<&str>) -> usize {
        self.select(ecosystem).map(BTreeMap::len).sum()
    }

    pub fn version_count(&self, ecosystem: Option<&str>) -> usize {
        self.select(ecosystem)
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum()
    }

    fn select(
        &self,
        ecosystem: Option<&str>,
    ) -> impl Iterator<Item = &BTreeMap<String, BTreeSet<String>>> {
        let wanted = ecosystem.map(normalize_ecosystem_id);
        self.threats
            .iter()
            .filter(move |(id, _)| wanted.as_ref().is_none_or(|wanted| wanted == *id))
            .map(|(_, packages)| packages)
    }

    pub fn is_empty(&self) -> bool {
        self.threats.is_empty()
    }

    /// Threat names in load order
    pub fn loaded_threats(&self) -> &[String] {
        &self.loaded_threats
    }

    pub fn metadata(&self, threat: &str) -> Option<&ThreatMetadata> {
        self.metadata.get(threat)
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            threats: self.loaded_threats.clone(),
            packages: self.package_count(None),
            versions: self.version_count(None),
            ecosystems: self
                .threats
                .keys()
                .map(|ecosystem| EcosystemSummary {
                    ecosystem: ecosystem.clone(),
                    packages: self.package_count(Some(ecosystem)),
                    versions: self.version_count(Some(ecosystem)),
                })
                .collect(),
        }
    }
}

fn canonical_name(ecosystem: &str, name: &str) -> String {
    match ecosystem.parse::<Ecosystem>() {
        Ok(ecosystem) => ecosystem.canonical_package_name(name),
        Err(()) => name.trim().to_string(),
    }
}

pub(crate) fn is_header(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|first| {
        HEADER_TOKENS
            .iter()
            .any(|token| first.eq_ignore_ascii_case(token))
    })
}

/// Split a data row into `(ecosystem, name, version)`
///
/// Two-column rows are the legacy npm-only format.
pub(crate) fn parse_row(record: &StringRecord) -> Result<(String, String, String), String> {
    let (ecosystem, name, version) = match record.len() {
        3 => (&record[0], &record[1], &record[2]),
        2 => ("npm", &record[0], &record[1]),
        n => return Err(format!("expected 2 or 3 columns, found {n}")),
    };

    if ecosystem.is_empty() || name.is_empty() || version.is_empty() {
        return Err("empty field".to_string());
    }

    Ok((ecosystem.to_string(), name.to_string(), version.to_string()))
}
