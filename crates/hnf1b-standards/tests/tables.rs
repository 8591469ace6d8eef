#![allow(missing_docs)]

use std::fs;

use hnf1b_standards::{FeatureHandler, Standards, StandardsError};

fn standards() -> Standards {
    Standards::embedded().expect("embedded tables parse")
}

#[test]
fn test_embedded_tables_load() {
    let standards = standards();
    assert!(!standards.terms.is_empty());
    assert_eq!(
        standards.terms.label("MONDO:0011593"),
        Some("renal cysts and diabetes syndrome")
    );
    assert!(standards.features.columns().len() > 20);
}

#[test]
fn test_every_feature_term_has_a_static_label() {
    let standards = standards();
    for column in standards.features.columns() {
        assert!(
            standards.terms.label(&column.term.id).is_some(),
            "missing static label for {}",
            column.term.id
        );
    }
    for class in standards.staging.classes() {
        assert!(standards.terms.label(&class.id).is_some(), "{}", class.id);
    }
}

#[test]
fn test_header_aliases_match_across_spellings() {
    let standards = standards();
    for header in ["RenalInsufficancy", "renal_insufficiency", "CKD stage", "ckd-stage"] {
        let column = standards
            .features
            .match_header(header)
            .unwrap_or_else(|| panic!("no column for {header}"));
        assert_eq!(column.key, "renal_insufficiency");
        assert_eq!(column.handler, FeatureHandler::RenalStaging);
    }
    assert!(standards.features.match_header("Comment").is_none());
}

#[test]
fn test_stage_bound_columns_carry_fixed_onset() {
    let standards = standards();
    let antenatal = standards.features.get("antenatal_renal").expect("column");
    assert_eq!(antenatal.onset.as_deref(), Some("HP:0030674"));
    let cysts = standards.features.get("renal_cysts").expect("column");
    assert_eq!(cysts.onset, None);
}

#[test]
fn test_staging_lookup() {
    let standards = standards();
    let stage = |raw: &str| standards.staging.lookup(raw).map(|c| c.id.clone());
    assert_eq!(stage("Stage 3").as_deref(), Some("HP:0012625"));
    assert_eq!(stage("CKD3").as_deref(), Some("HP:0012625"));
    assert_eq!(stage("G3b").as_deref(), Some("HP:0012625"));
    assert_eq!(stage("ESRD").as_deref(), Some("HP:0003774"));
    assert_eq!(stage("stage 5 (dialysis since 2019)").as_deref(), Some("HP:0003774"));
    assert_eq!(stage("yes").as_deref(), Some("HP:0012622"));
    assert_eq!(stage("moderately reduced"), None);
}

#[test]
fn test_onset_terms_found_in_text() {
    let standards = standards();
    assert_eq!(
        standards.onsets.lookup("At birth").map(|c| c.id.as_str()),
        Some("HP:0003577")
    );
    assert_eq!(
        standards.onsets.find_in("yes (prenatal)").map(|c| c.id.as_str()),
        Some("HP:0030674")
    );
    assert!(standards.onsets.find_in("yes").is_none());
}

#[test]
fn test_modifiers_in_order_of_mention() {
    let standards = standards();
    let found = standards.modifiers.find_in("yes, severe bilateral");
    let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["HP:0012828", "HP:0012832"]);
    assert!(standards.modifiers.find_in("yes").is_empty());
}

#[test]
fn test_sequence_registry_versions_are_exact() {
    let standards = standards();
    let chr17 = standards.sequences.by_chromosome("chr17").expect("chr17");
    assert_eq!(chr17.refseq, "NC_000017.11");
    assert_eq!(chr17.refget, "SQ.dLZ15tNO1Ur0IcGjwc3Sdi_0A6Yf4zm7");
    assert_eq!(
        standards.sequences.by_refseq("NC_000017.11").map(|e| e.chromosome.as_str()),
        Some("17")
    );
    assert!(standards.sequences.by_refseq("NC_000017.10").is_none());
    assert!(standards.sequences.by_chromosome("22").is_none());
}

#[test]
fn test_resources_follow_used_prefixes() {
    let standards = standards();
    let resources = standards.resources.for_prefixes(["MONDO", "HP"]);
    let prefixes: Vec<&str> = resources.iter().map(|r| r.namespace_prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["HP", "MONDO"]);
}

#[test]
fn test_override_dir_replaces_single_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("terms.csv"),
        "code,label\nHP:0000107,Renal cyst (curated)\n",
    )
    .expect("write override");

    let standards = Standards::load_from_dir(dir.path()).expect("load");
    assert_eq!(standards.terms.label("HP:0000107"), Some("Renal cyst (curated)"));
    assert_eq!(standards.terms.len(), 1);
    // Tables not present in the directory come from the embedded copy.
    assert!(standards.staging.lookup("stage 2").is_some());
}

#[test]
fn test_override_dir_reports_bad_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("sequences.csv"), "chromosome,refseq,refget,assembly\n17,NC_000017.11,dLZ15,GRCh38\n")
        .expect("write override");

    let err = Standards::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, StandardsError::InvalidRow { ref table, .. } if table == "sequences"));
}
