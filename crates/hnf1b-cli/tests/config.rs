#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use hnf1b_cli::config::{FileConfig, Overrides};

const FULL: &str = r#"
[ontology]
cache_dir = "/var/cache/terms"
ttl_days = 7
timeout_ms = 1500
offline = false

[[ontology.providers]]
name = "local"
url_template = "http://localhost:8080/terms/{iri_code}"
label_pointer = "/label"

[digest]
standard = false

[pipeline]
workers = 3
store_retries = 5
"#;

#[test]
fn test_file_values_are_applied() {
    let settings = FileConfig::parse(FULL)
        .expect("valid config")
        .settings(&Overrides::default());

    assert_eq!(settings.resolver.cache_dir, Some(PathBuf::from("/var/cache/terms")));
    assert_eq!(settings.resolver.ttl_days, 7);
    assert_eq!(settings.resolver.timeout, Duration::from_millis(1500));
    assert_eq!(settings.resolver.providers.len(), 1);
    assert_eq!(settings.resolver.providers[0].name, "local");
    assert!(!settings.standard_digest);
    assert_eq!(settings.options.workers, 3);
    assert_eq!(settings.options.store_retries, 5);
}

#[test]
fn test_flags_override_file() {
    let config = FileConfig::parse(FULL).expect("valid config");
    let settings = config.settings(&Overrides {
        offline: true,
        no_standard_digest: false,
        workers: Some(1),
        cache_dir: Some(PathBuf::from("/tmp/terms")),
    });
    assert!(settings.resolver.offline);
    assert_eq!(settings.options.workers, 1);
    assert_eq!(settings.resolver.cache_dir, Some(PathBuf::from("/tmp/terms")));
    // The file disabled standard digests; not passing the flag keeps that.
    assert!(!settings.standard_digest);
}

#[test]
fn test_no_standard_digest_flag_wins() {
    let settings = FileConfig::parse("[digest]\nstandard = true\n")
        .expect("valid config")
        .settings(&Overrides {
            no_standard_digest: true,
            ..Overrides::default()
        });
    assert!(!settings.standard_digest);
}

#[test]
fn test_partial_sections_keep_defaults() {
    let settings = FileConfig::parse("[pipeline]\nworkers = 2\n")
        .expect("valid config")
        .settings(&Overrides::default());
    assert_eq!(settings.options.workers, 2);
    assert_eq!(settings.options.store_retries, 2);
    assert_eq!(settings.resolver.ttl_days, hnf1b_ontology::DEFAULT_TTL_DAYS);
    let names: Vec<&str> = settings
        .resolver
        .providers
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["ols4", "jax"]);
}

#[test]
fn test_load_reports_path_on_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hnf1b.toml");
    fs::write(&path, "[digest]\nstandard = \"yes\"\n").expect("write");
    let error = FileConfig::load(&path).expect_err("wrong type");
    assert!(format!("{error:#}").contains("hnf1b.toml"));

    assert!(FileConfig::load(&dir.path().join("missing.toml")).is_err());
    assert_eq!(
        FileConfig::load_optional(None).expect("defaults"),
        FileConfig::default()
    );
}
