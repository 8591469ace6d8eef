#![allow(missing_docs)]

use hnf1b_model::{
    AcmgClassification, Age, InterpretationStatus, NormalizedCoordinate, NotationSource,
    OntologyClass, PhenotypicFeature, Sex, TimeElement, VariantClass, VariantNotations,
    VariantType,
};

#[test]
fn test_notation_precedence_prefers_hgvs() {
    let notations = VariantNotations {
        hgvs: Some("NM_000458.4:c.544+1G>T".to_string()),
        genomic: Some("chr17-37739578-C-A".to_string()),
        vcf_info: None,
        free_text: Some("splice site".to_string()),
    };
    let chosen = notations.preferred().expect("notation");
    assert_eq!(chosen.source, NotationSource::Hgvs);
    assert_eq!(chosen.value, "NM_000458.4:c.544+1G>T");
}

#[test]
fn test_notation_blank_columns_are_skipped() {
    let notations = VariantNotations {
        hgvs: Some("   ".to_string()),
        genomic: None,
        vcf_info: None,
        free_text: Some("whole gene deletion".to_string()),
    };
    let chosen = notations.preferred().expect("notation");
    assert_eq!(chosen.source, NotationSource::FreeText);
    assert!(!notations.is_empty());
    assert!(VariantNotations::default().is_empty());
}

#[test]
fn test_sex_parsing() {
    assert_eq!(Sex::parse("F"), Sex::Female);
    assert_eq!(Sex::parse(" male "), Sex::Male);
    assert_eq!(Sex::parse("n.a."), Sex::UnknownSex);
}

#[test]
fn test_acmg_parsing_and_status() {
    assert_eq!(AcmgClassification::parse("Likely pathogenic"), AcmgClassification::LikelyPathogenic);
    assert_eq!(AcmgClassification::parse("VUS"), AcmgClassification::UncertainSignificance);
    assert_eq!(AcmgClassification::parse(""), AcmgClassification::NotProvided);
    assert_eq!(
        AcmgClassification::Pathogenic.interpretation_status(),
        InterpretationStatus::Causative
    );
}

#[test]
fn test_coordinate_classes() {
    let snv = NormalizedCoordinate::from_alleles("17", 37739578, "C", "T").unwrap();
    assert_eq!(snv.class(), VariantClass::Snv);

    let indel = NormalizedCoordinate::from_alleles("17", 37710502, "ATCG", "A").unwrap();
    assert_eq!(indel.class(), VariantClass::Indel);
    assert_eq!(indel.variant_type, VariantType::Deletion);
    assert_eq!(indel.end, 37710505);

    let big_ref = "A".repeat(60);
    let large = NormalizedCoordinate::from_alleles("17", 100, big_ref, "A").unwrap();
    assert_eq!(large.class(), VariantClass::Structural);

    let cnv =
        NormalizedCoordinate::from_range("17", 36459258, 37832869, VariantType::Deletion).unwrap();
    assert!(cnv.is_structural());
    assert_eq!(cnv.span(), 1_373_612);
}

#[test]
fn test_feature_serializes_camel_case_and_omits_defaults() {
    let feature = PhenotypicFeature {
        kind: OntologyClass::new("HP:0000107", "Renal cyst"),
        excluded: false,
        modifiers: vec![],
        onset: Some(TimeElement::Age(Age {
            iso8601duration: "P1Y9M".to_string(),
        })),
        evidence: vec![],
    };
    let json = serde_json::to_string(&feature).expect("serialize feature");
    assert_eq!(
        json,
        r#"{"type":{"id":"HP:0000107","label":"Renal cyst"},"onset":{"age":{"iso8601duration":"P1Y9M"}}}"#
    );

    let excluded = PhenotypicFeature {
        excluded: true,
        onset: None,
        ..feature
    };
    let json = serde_json::to_string(&excluded).expect("serialize feature");
    assert!(json.contains(r#""excluded":true"#));
}

#[test]
fn test_sex_serializes_screaming_case() {
    assert_eq!(serde_json::to_string(&Sex::UnknownSex).unwrap(), r#""UNKNOWN_SEX""#);
}
