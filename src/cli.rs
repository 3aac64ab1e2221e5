use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use package_scan::config::ScanConfig;
use package_scan::engine::{DeclaredDependency, MatchEngine, MatchResult};
use package_scan::threat::{
    IndexSummary, LoadWarning, ThreatIndex, ThreatMetadata, validate_threat_file,
};

#[derive(Parser)]
#[command(name = "package-scan")]
#[command(version, about = "Check declared dependencies against compromised package versions")]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/package-scan/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs as JSON lines to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check one declared dependency
    Check {
        #[arg(long)]
        ecosystem: String,
        #[arg(long)]
        package: String,
        /// Declared version or range, as written in the manifest
        #[arg(long, allow_hyphen_values = true)]
        spec: String,
        #[command(flatten)]
        source: ThreatSource,
    },
    /// Check a JSON array of {ecosystem, name, spec} objects
    Batch {
        /// Input file, or `-` for stdin
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        source: ThreatSource,
    },
    /// Inspect threat databases
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
pub enum DbAction {
    /// Show metadata and statistics
    Info {
        #[command(flatten)]
        source: ThreatSource,
    },
    /// Validate a threat CSV file
    Validate {
        #[arg(long)]
        file: PathBuf,
        /// Treat unknown ecosystems as errors
        #[arg(long)]
        strict: bool,
    },
}

/// Where compromised versions come from
#[derive(Args, Debug, Default)]
pub struct ThreatSource {
    /// Single threat CSV file
    #[arg(long, conflicts_with = "threats")]
    pub csv: Option<PathBuf>,

    /// Threat name to load from the threats directory (repeatable)
    #[arg(long = "threat")]
    pub threats: Vec<String>,
}

impl ThreatSource {
    fn load(&self, config: &ScanConfig) -> anyhow::Result<ThreatIndex> {
        let index = match &self.csv {
            Some(path) => ThreatIndex::load_path(path)?,
            None => {
                let dir = config.resolve_threats_dir();
                let names = (!self.threats.is_empty()).then_some(self.threats.as_slice());
                ThreatIndex::load_dir(&dir, names)?
            }
        };
        info!("Threats loaded: {}", index.loaded_threats().join(", "));
        Ok(index)
    }
}

#[derive(Serialize)]
struct DbInfo<'a> {
    summary: IndexSummary,
    metadata: IndexMap<&'a str, &'a ThreatMetadata>,
    warnings: &'a [LoadWarning],
}

/// Run a parsed command; the exit code is 1 when matches were found
/// or validation failed
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ScanConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Check {
            ecosystem,
            package,
            spec,
            source,
        } => {
            let index = source.load(&config)?;
            let engine = MatchEngine::with_config(&index, config);
            let results = engine.evaluate_all(&[DeclaredDependency::new(&ecosystem, &package, &spec)]);
            report_matches(&results)
        }
        Command::Batch { input, source } => {
            let dependencies = read_dependencies(&input)?;
            let index = source.load(&config)?;
            let engine = MatchEngine::with_config(&index, config);
            let results = engine.evaluate_all(&dependencies);
            report_matches(&results)
        }
        Command::Db {
            action: DbAction::Info { source },
        } => {
            let index = source.load(&config)?;
            let info = DbInfo {
                summary: index.summary(),
                metadata: index
                    .loaded_threats()
                    .iter()
                    .filter_map(|name| Some((name.as_str(), index.metadata(name)?)))
                    .collect(),
                warnings: index.warnings(),
            };
            write_json(&info)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Db {
            action: DbAction::Validate { file, strict },
        } => {
            let report = validate_threat_file(&file, strict)?;
            write_json(&report)?;
            Ok(exit_code(!report.is_valid()))
        }
    }
}

fn read_dependencies(input: &Path) -> anyhow::Result<Vec<DeclaredDependency>> {
    if input == Path::new("-") {
        return serde_json::from_reader(io::stdin().lock())
            .context("Failed to parse dependencies from stdin");
    }
    let file = std::fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse dependencies from {}", input.display()))
}

fn report_matches(results: &[MatchResult]) -> anyhow::Result<ExitCode> {
    write_json(results)?;
    Ok(exit_code(!results.is_empty()))
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn exit_code(findings: bool) -> ExitCode {
    if findings {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
