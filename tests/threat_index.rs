use std::fs;

use package_scan::threat::{DatabaseLoadError, ThreatIndex, validate_threat_file};
use tempfile::TempDir;

fn write_threats(dir: &TempDir, files: &[(&str, &str)]) {
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
}

#[test]
fn load_path_reads_legacy_csv_into_npm() {
    let temp_dir = TempDir::new().unwrap();
    write_threats(&temp_dir, &[("legacy.csv", "Package Name,Version\nleft-pad,1.3.0\n")]);

    let index = ThreatIndex::load_path(&temp_dir.path().join("legacy.csv")).unwrap();

    assert_eq!(
        index.get_all_packages().collect::<Vec<_>>(),
        vec![("npm", "left-pad")]
    );
    assert!(index.is_compromised("npm", "left-pad", "1.3.0"));
    assert_eq!(index.loaded_threats(), ["legacy"]);
}

#[test]
fn load_dir_merges_every_threat_file_in_name_order() {
    let temp_dir = TempDir::new().unwrap();
    write_threats(
        &temp_dir,
        &[
            (
                "sha1-hulud.csv",
                "# Description: second wave\n# Source: advisory\necosystem,name,version\nnpm,@ctrl/tinycolor,4.1.2\n",
            ),
            (
                "log4shell.csv",
                "ecosystem,name,version\nmaven,org.apache.logging.log4j:log4j-core,2.14.1\nnpm,@ctrl/tinycolor,4.1.2\n",
            ),
            ("README.md", "not a threat file"),
        ],
    );

    let index = ThreatIndex::load_dir(temp_dir.path(), None).unwrap();

    assert_eq!(index.loaded_threats(), ["log4shell", "sha1-hulud"]);
    assert_eq!(index.package_count(None), 2);
    assert_eq!(index.version_count(Some("npm")), 1);
    assert_eq!(
        index.metadata("sha1-hulud").and_then(|m| m.get("source")),
        Some("advisory")
    );
    assert_eq!(
        index.metadata("sha1-hulud").map(|m| m.missing_recommended()),
        Some(vec!["last updated".to_string()])
    );
}

#[test]
fn load_dir_loads_only_requested_threats() {
    let temp_dir = TempDir::new().unwrap();
    write_threats(
        &temp_dir,
        &[
            ("a.csv", "ecosystem,name,version\nnpm,a,1.0.0\n"),
            ("b.csv", "ecosystem,name,version\npip,b,2.0\n"),
        ],
    );

    let index = ThreatIndex::load_dir(temp_dir.path(), Some(&["b".to_string()][..])).unwrap();

    assert_eq!(index.get_ecosystems().into_iter().collect::<Vec<_>>(), vec!["pip"]);
}

#[test]
fn load_dir_rejects_unknown_threat_names() {
    let temp_dir = TempDir::new().unwrap();
    write_threats(&temp_dir, &[("a.csv", "npm,a,1.0.0\n")]);

    let err = ThreatIndex::load_dir(temp_dir.path(), Some(&["missing".to_string()][..])).unwrap_err();

    assert!(matches!(err, DatabaseLoadError::UnknownThreat { name, .. } if name == "missing"));
}

#[test]
fn load_dir_without_csv_files_is_an_error() {
    let temp_dir = TempDir::new().unwrap();

    let err = ThreatIndex::load_dir(temp_dir.path(), None).unwrap_err();

    assert!(matches!(err, DatabaseLoadError::EmptyDirectory { .. }));
}

#[test]
fn load_path_reports_missing_file() {
    let temp_dir = TempDir::new().unwrap();

    let err = ThreatIndex::load_path(&temp_dir.path().join("nope.csv")).unwrap_err();

    assert!(matches!(err, DatabaseLoadError::Io { .. }));
}

#[test]
fn load_tolerates_bad_rows_between_good_ones() {
    let content = "ecosystem,name,version\nnpm,good,1.0.0\nnpm,bad,1.0,extra\nnpm,,1.0.0\npip,fine,2.0\n";

    let index = ThreatIndex::load(content.as_bytes(), "inline").unwrap();

    assert_eq!(index.version_count(None), 2);
    assert_eq!(index.warnings().len(), 2);
}

#[test]
fn validate_threat_file_reads_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    write_threats(
        &temp_dir,
        &[(
            "feed.csv",
            "# Description: d\n# Source: s\n# Last updated: today\necosystem,name,version\ngem,rails,7.0.0\n",
        )],
    );
    let path = temp_dir.path().join("feed.csv");

    assert!(validate_threat_file(&path, false).unwrap().is_valid());
    assert!(!validate_threat_file(&path, true).unwrap().is_valid());
}
