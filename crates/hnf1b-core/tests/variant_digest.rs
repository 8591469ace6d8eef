#![allow(missing_docs)]

use hnf1b_core::vrs::{Allele, SequenceLocation, SequenceReference, VrsVariation, variation_json};
use hnf1b_core::{VariantDigestBuilder, parse_coordinate, parse_coordinate_with_info};
use hnf1b_model::{
    DigestMethod, NotationSource, VariantClass, VariantIdentifier, VariantNotations, VariantType,
};
use hnf1b_standards::{SequenceRegistry, Standards};

const CHR17: &str = "SQ.dLZ15tNO1Ur0IcGjwc3Sdi_0A6Yf4zm7";

fn sequences() -> SequenceRegistry {
    Standards::embedded().expect("standards").sequences
}

fn builder() -> VariantDigestBuilder {
    VariantDigestBuilder::new(sequences(), true)
}

fn id_of(notations: &VariantNotations) -> VariantIdentifier {
    builder()
        .build(notations, None)
        .expect("variant record")
        .identifier
}

fn genomic(value: &str) -> VariantNotations {
    VariantNotations {
        genomic: Some(value.to_string()),
        ..Default::default()
    }
}

fn hgvs(value: &str) -> VariantNotations {
    VariantNotations {
        hgvs: Some(value.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_canonical_snv_input() {
    let variation = VrsVariation::Allele(Allele {
        location: SequenceLocation {
            sequence_reference: SequenceReference {
                refget_accession: CHR17.to_string(),
            },
            start: 37739577,
            end: 37739578,
        },
        sequence: "T".to_string(),
    });
    insta::assert_snapshot!(
        variation_json(&variation),
        @r#"{"location":"sDJU0IeInHBoWPkL_6hElzBgDUH-QTx3","state":{"sequence":"T","type":"LiteralSequenceExpression"},"type":"Allele"}"#
    );
}

#[test]
fn test_snv_identifier_is_stable() {
    assert_eq!(
        id_of(&genomic("chr17-37739578-C-T")),
        VariantIdentifier::Standard("ga4gh:VA.6RhQHmGHrdq4oW7EwU9J3Eqw2tMHxSbA".to_string())
    );
}

#[test]
fn test_equal_variants_share_identifier_across_notations() {
    let expected = id_of(&genomic("chr17-37739578-C-T"));
    for notation in ["17:37739578:C:T", "chr17:37739578 C>T", "CHR17_37739578_c_t"] {
        assert_eq!(id_of(&genomic(notation)), expected, "{notation}");
    }
    assert_eq!(id_of(&hgvs("NC_000017.11:g.37739578C>T")), expected);
}

#[test]
fn test_padded_and_trimmed_deletions_agree() {
    // Same deletion of TCG written with and without a shared padding base.
    let padded = id_of(&genomic("chr17-37710502-ATCG-A"));
    let hgvs_range = id_of(&hgvs("NC_000017.11:g.37710503_37710505del"));
    assert_eq!(padded, hgvs_range);
}

#[test]
fn test_distinct_variants_have_distinct_identifiers() {
    let ids = [
        id_of(&genomic("chr17-37739578-C-T")),
        id_of(&genomic("chr17-37739578-C-A")),
        id_of(&genomic("chr17-37739579-C-T")),
        id_of(&genomic("17:36459258-37832869:DEL")),
        id_of(&genomic("17:36459258-37832869:DUP")),
    ];
    for (i, a) in ids.iter().enumerate() {
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_cnv_range_is_copy_loss() {
    let coordinate = parse_coordinate("17:36459258-37832869:DEL", &sequences()).expect("range");
    assert_eq!(coordinate.variant_type, VariantType::Deletion);
    assert_eq!(coordinate.class(), VariantClass::Structural);
    assert_eq!(coordinate.span(), 1_373_612);
    assert_eq!(
        id_of(&genomic("17:36459258-37832869:DEL")),
        VariantIdentifier::Standard("ga4gh:CX.nx1dXUxod0Wbjhj48wcyq_JMOFFY84bD".to_string())
    );
}

#[test]
fn test_symbolic_allele_matches_range_notation() {
    let sequences = sequences();
    let symbolic = parse_coordinate_with_info(
        "chr17-36459257-N-<DEL>",
        Some("SVTYPE=DEL;END=37832869"),
        &sequences,
    )
    .expect("symbolic allele");
    let range = parse_coordinate("17:36459258-37832869:DEL", &sequences).expect("range");
    assert_eq!(symbolic, range);

    let notations = VariantNotations {
        genomic: Some("chr17-36459257-N-<DEL>".to_string()),
        vcf_info: Some("SVTYPE=DEL;END=37832869".to_string()),
        ..Default::default()
    };
    assert_eq!(id_of(&notations), id_of(&genomic("17:36459258-37832869:DEL")));
}

#[test]
fn test_symbolic_allele_needs_info() {
    assert!(parse_coordinate_with_info("chr17-36459257-N-<DEL>", None, &sequences()).is_none());
    assert!(
        parse_coordinate_with_info(
            "chr17-36459257-N-<DEL>",
            Some("SVTYPE=DUP;END=37832869"),
            &sequences()
        )
        .is_none()
    );
}

#[test]
fn test_small_deletion_is_indel() {
    let coordinate = parse_coordinate("chr17-37710502-ATCG-A", &sequences()).expect("call");
    assert_eq!(coordinate.class(), VariantClass::Indel);
    assert_eq!(coordinate.variant_type, VariantType::Deletion);
    assert!(
        id_of(&genomic("chr17-37710502-ATCG-A"))
            .id()
            .is_some_and(|id| id.starts_with("ga4gh:VA."))
    );
}

#[test]
fn test_small_duplication_is_indel_regardless_of_notation() {
    let sequences = sequences();
    let range = parse_coordinate("17:37710503-37710505:DUP", &sequences).expect("range");
    let hgvs_dup = parse_coordinate("NC_000017.11:g.37710503_37710505dup", &sequences)
        .expect("hgvs dup");
    assert_eq!(range, hgvs_dup);
    assert_eq!(range.class(), VariantClass::Indel);
    // Without the duplicated bases there is no allele to digest.
    assert_eq!(id_of(&genomic("17:37710503-37710505:DUP")), VariantIdentifier::Unplaced);

    let with_bases = id_of(&hgvs("NC_000017.11:g.37710503_37710505dupTCG"));
    assert!(with_bases.id().is_some_and(|id| id.starts_with("ga4gh:VA.")));

    let large = parse_coordinate("17:37710503-37710552:DUP", &sequences).expect("range");
    assert_eq!(large.class(), VariantClass::Structural);
    assert!(
        id_of(&genomic("17:37710503-37710552:DUP"))
            .id()
            .is_some_and(|id| id.starts_with("ga4gh:CX."))
    );
}

#[test]
fn test_hgvs_takes_precedence_over_genomic() {
    let notations = VariantNotations {
        hgvs: Some("NC_000017.11:g.37739578C>T".to_string()),
        genomic: Some("chr17-37739600-G-A".to_string()),
        free_text: Some("c.544C>T".to_string()),
        ..Default::default()
    };
    let record = builder().build(&notations, None).expect("record");
    assert_eq!(record.notation.source, NotationSource::Hgvs);
    assert_eq!(record.coordinate.expect("coordinate").start, 37739578);
    assert_eq!(record.identifier, id_of(&genomic("chr17-37739578-C-T")));
}

#[test]
fn test_unlisted_chromosome_uses_fallback() {
    let record = builder()
        .build(&genomic("chr3-12345-G-A"), None)
        .expect("record");
    assert_eq!(record.identifier.method(), Some(DigestMethod::Fallback));
    assert!(
        record
            .identifier
            .id()
            .is_some_and(|id| id.starts_with("fallback:VA."))
    );
}

#[test]
fn test_disabled_standard_digest_never_mixes_schemes() {
    let fallback = VariantDigestBuilder::new(sequences(), false);
    let a = fallback.build(&genomic("chr17-37739578-C-T"), None).expect("a");
    let b = fallback
        .build(&hgvs("NC_000017.11:g.37739578C>T"), None)
        .expect("b");
    assert_eq!(a.identifier, b.identifier);
    assert_eq!(
        a.identifier,
        VariantIdentifier::Fallback("fallback:VA.8d767e58bf4a813e5cc2e425eec8cf5e".to_string())
    );
}

#[test]
fn test_other_refseq_version_is_rejected() {
    assert!(parse_coordinate("NC_000017.10:g.36091638C>T", &sequences()).is_none());
}

#[test]
fn test_malformed_notations_are_unplaced() {
    for raw in ["chr17-abc-C-T", "17:500-100:DEL", "chr17-37739578-C-C", "chr99-1-A-G"] {
        let record = builder().build(&genomic(raw), None).expect("record");
        assert_eq!(record.identifier, VariantIdentifier::Unplaced, "{raw}");
    }
}

#[test]
fn test_positions_at_the_integer_limit_are_rejected() {
    let sequences = sequences();
    let max = u64::MAX;
    assert!(parse_coordinate(&format!("chr17-{max}-ATCG-A"), &sequences).is_none());
    assert!(parse_coordinate(&format!("NC_000017.11:g.{max}_{max}insA"), &sequences).is_none());
    assert!(
        parse_coordinate_with_info(
            &format!("chr17-{max}-N-<DEL>"),
            Some(&format!("SVTYPE=DEL;END={max}")),
            &sequences,
        )
        .is_none()
    );

    // The last representable single-base call still places.
    let call = parse_coordinate(&format!("chr17-{max}-C-T"), &sequences).expect("coordinate");
    assert_eq!((call.start, call.end), (max, max));

    let record = builder()
        .build(&genomic(&format!("chr17-{max}-ATCG-A")), None)
        .expect("record");
    assert_eq!(record.identifier, VariantIdentifier::Unplaced);
}
