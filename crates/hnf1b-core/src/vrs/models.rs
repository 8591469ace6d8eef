//! VRS 2.0 objects needed for digest computation.

use hnf1b_model::{NormalizedCoordinate, VariantClass, VariantType};

/// A sequence identified by its GA4GH refget accession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReference {
    /// `SQ.` accession, or a stand-in name for fallback digests.
    pub refget_accession: String,
}

/// Interbase (0-based, half-open) interval on a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceLocation {
    pub sequence_reference: SequenceReference,
    pub start: u64,
    pub end: u64,
}

/// A literal sequence state at a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allele {
    pub location: SequenceLocation,
    pub sequence: String,
}

/// Direction of a copy-number change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyChange {
    Loss,
    Gain,
}

impl CopyChange {
    /// EFO code written into the canonical form.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Loss => "EFO:0030067",
            Self::Gain => "EFO:0030070",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyNumberChange {
    pub location: SequenceLocation,
    pub copy_change: CopyChange,
}

/// Canonical VRS form of a normalized coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VrsVariation {
    Allele(Allele),
    CopyNumberChange(CopyNumberChange),
}

impl VrsVariation {
    /// Build the canonical form against `accession`.
    ///
    /// Structural events become copy-number changes; everything else becomes
    /// an allele with the shared prefix/suffix of its alleles trimmed.
    /// Returns `None` when the coordinate cannot be expressed (an unsized
    /// gain or loss of unknown direction).
    pub fn from_coordinate(coordinate: &NormalizedCoordinate, accession: &str) -> Option<Self> {
        let reference = SequenceReference {
            refget_accession: accession.to_string(),
        };
        let location = |start: u64, end: u64| SequenceLocation {
            sequence_reference: reference.clone(),
            start,
            end,
        };

        if coordinate.class() == VariantClass::Structural {
            let copy_change = match coordinate.variant_type {
                VariantType::Deletion => CopyChange::Loss,
                VariantType::Duplication => CopyChange::Gain,
                VariantType::Insertion => CopyChange::Gain,
                _ => {
                    let removed = coordinate
                        .reference
                        .as_ref()
                        .map_or(coordinate.span(), |r| r.len() as u64);
                    let added = coordinate.alternate.as_ref()?.len() as u64;
                    match removed.cmp(&added) {
                        std::cmp::Ordering::Greater => CopyChange::Loss,
                        std::cmp::Ordering::Less => CopyChange::Gain,
                        std::cmp::Ordering::Equal => return None,
                    }
                }
            };
            let (start, end) = match (&coordinate.reference, &coordinate.alternate) {
                (Some(r), Some(a)) => {
                    let (left, right, _, _) = trim_alleles(r, a);
                    (
                        coordinate.start - 1 + left as u64,
                        coordinate.end - right as u64,
                    )
                }
                _ => (coordinate.start - 1, coordinate.end),
            };
            return Some(Self::CopyNumberChange(CopyNumberChange {
                location: location(start, end.max(start)),
                copy_change,
            }));
        }

        match (&coordinate.reference, &coordinate.alternate) {
            (Some(r), Some(a)) => {
                let (left, right, _, trimmed_alt) = trim_alleles(r, a);
                let start = coordinate.start - 1 + left as u64;
                let end = coordinate.end - right as u64;
                Some(Self::Allele(Allele {
                    location: location(start, end),
                    sequence: trimmed_alt,
                }))
            }
            _ => {
                let sequence = coordinate.range_sequence()?.to_string();
                let (start, end) = match coordinate.variant_type {
                    // Between the flanking bases.
                    VariantType::Insertion => (coordinate.start, coordinate.start),
                    // Copy placed right after the duplicated bases.
                    VariantType::Duplication => (coordinate.end, coordinate.end),
                    _ => (coordinate.start - 1, coordinate.end),
                };
                Some(Self::Allele(Allele {
                    location: location(start, end),
                    sequence,
                }))
            }
        }
    }

    pub fn location(&self) -> &SequenceLocation {
        match self {
            Self::Allele(allele) => &allele.location,
            Self::CopyNumberChange(cnv) => &cnv.location,
        }
    }
}

/// Trim the common prefix, then the common suffix, of two alleles.
///
/// Returns `(left_trimmed, right_trimmed, reference, alternate)`.
pub fn trim_alleles(reference: &str, alternate: &str) -> (usize, usize, String, String) {
    let r = reference.as_bytes();
    let a = alternate.as_bytes();
    let left = r.iter().zip(a).take_while(|(x, y)| x == y).count();
    let (r, a) = (&r[left..], &a[left..]);
    let right = r
        .iter()
        .rev()
        .zip(a.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let r = &r[..r.len() - right];
    let a = &a[..a.len() - right];
    (
        left,
        right,
        String::from_utf8_lossy(r).into_owned(),
        String::from_utf8_lossy(a).into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_prefix_then_suffix() {
        assert_eq!(trim_alleles("ATCG", "A"), (1, 0, "TCG".into(), String::new()));
        assert_eq!(trim_alleles("C", "T"), (0, 0, "C".into(), "T".into()));
        assert_eq!(trim_alleles("AG", "AGG"), (2, 0, String::new(), "G".into()));
    }

    #[test]
    fn deletion_call_becomes_interbase_allele() {
        let coordinate =
            NormalizedCoordinate::from_alleles("17", 37710502, "ATCG", "A").unwrap();
        let Some(VrsVariation::Allele(allele)) = VrsVariation::from_coordinate(&coordinate, "SQ.x")
        else {
            panic!("expected allele");
        };
        assert_eq!((allele.location.start, allele.location.end), (37710502, 37710505));
        assert_eq!(allele.sequence, "");
    }

    #[test]
    fn range_deletion_becomes_copy_loss() {
        let coordinate = NormalizedCoordinate::from_range(
            "17",
            36459258,
            37832869,
            VariantType::Deletion,
        )
        .unwrap();
        let Some(VrsVariation::CopyNumberChange(cnv)) =
            VrsVariation::from_coordinate(&coordinate, "SQ.x")
        else {
            panic!("expected copy number change");
        };
        assert_eq!(cnv.copy_change, CopyChange::Loss);
        assert_eq!((cnv.location.start, cnv.location.end), (36459257, 37832869));
    }
}
