//! Variant Digest Builder.
//!
//! Picks the coordinate of an individual's variant from its competing
//! notations, builds the VRS canonical form and assigns a
//! content-addressed identifier.

use tracing::{debug, trace};

use hnf1b_ingest::AnnotationIndex;
use hnf1b_model::{
    DigestMethod, NormalizedCoordinate, NotationSource, VariantIdentifier, VariantNotations,
    VariantRecord,
};
use hnf1b_standards::SequenceRegistry;

use crate::coordinate::{parse_coordinate, parse_coordinate_with_info};
use crate::vrs::{VrsVariation, fallback_identifier, ga4gh_identifier};

/// Builds [`VariantRecord`]s. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct VariantDigestBuilder {
    sequences: SequenceRegistry,
    standard: bool,
}

impl VariantDigestBuilder {
    /// `standard = false` forces fallback identifiers for every variant.
    pub fn new(sequences: SequenceRegistry, standard: bool) -> Self {
        Self {
            sequences,
            standard,
        }
    }

    pub fn sequences(&self) -> &SequenceRegistry {
        &self.sequences
    }

    /// Digest scheme for a chromosome. Depends on nothing but configuration
    /// and the chromosome, so equal variants never mix schemes.
    pub fn method_for(&self, chromosome: &str) -> DigestMethod {
        if self.standard && self.sequences.by_chromosome(chromosome).is_some() {
            DigestMethod::Standard
        } else {
            DigestMethod::Fallback
        }
    }

    /// Parse one notation of the given column family.
    pub fn parse_notation(
        &self,
        source: NotationSource,
        value: &str,
        vcf_info: Option<&str>,
    ) -> Option<NormalizedCoordinate> {
        match source {
            NotationSource::Genomic => parse_coordinate_with_info(value, vcf_info, &self.sequences),
            NotationSource::Hgvs | NotationSource::FreeText => {
                parse_coordinate(value, &self.sequences)
            }
        }
    }

    /// First parseable notation, trying the preferred one first and then
    /// the rest in precedence order.
    pub fn locate(&self, notations: &VariantNotations) -> Option<(NotationSource, NormalizedCoordinate)> {
        let vcf_info = notations.vcf_info.as_deref().map(str::trim).filter(|v| !v.is_empty());
        NotationSource::precedence().iter().find_map(|source| {
            let value = notations.get(*source)?;
            let coordinate = self.parse_notation(*source, value, vcf_info);
            if coordinate.is_none() {
                trace!(source = %source, notation = value, "Notation has no coordinate");
            }
            coordinate.map(|c| (*source, c))
        })
    }

    /// Canonical VRS form under the scheme chosen for the chromosome.
    pub fn canonical_form(&self, coordinate: &NormalizedCoordinate) -> Option<(VrsVariation, DigestMethod)> {
        let method = self.method_for(&coordinate.chromosome);
        let accession = match method {
            DigestMethod::Standard => self
                .sequences
                .by_chromosome(&coordinate.chromosome)?
                .refget
                .clone(),
            DigestMethod::Fallback => coordinate.chromosome.clone(),
        };
        VrsVariation::from_coordinate(coordinate, &accession).map(|v| (v, method))
    }

    /// Identifier of a coordinate; `Unplaced` when it has no canonical form.
    pub fn identify(&self, coordinate: &NormalizedCoordinate) -> VariantIdentifier {
        match self.canonical_form(coordinate) {
            Some((variation, DigestMethod::Standard)) => {
                VariantIdentifier::Standard(ga4gh_identifier(&variation))
            }
            Some((variation, DigestMethod::Fallback)) => {
                VariantIdentifier::Fallback(fallback_identifier(&variation))
            }
            None => VariantIdentifier::Unplaced,
        }
    }

    /// Resolve an individual's variant. `None` when no notation is present.
    pub fn build(
        &self,
        notations: &VariantNotations,
        annotations: Option<&AnnotationIndex>,
    ) -> Option<VariantRecord> {
        let notation = notations.preferred()?;
        let Some((source, coordinate)) = self.locate(notations) else {
            debug!(notation = %notation.value, "Variant left unplaced");
            return Some(VariantRecord {
                notation,
                coordinate: None,
                identifier: VariantIdentifier::Unplaced,
                annotation: None,
            });
        };

        let identifier = self.identify(&coordinate);
        debug!(
            source = %source,
            coordinate = %coordinate,
            class = coordinate.class().as_str(),
            identifier = identifier.id().unwrap_or("unplaced"),
            "Variant resolved"
        );
        let annotation = annotations.and_then(|index| index.get(&coordinate.key()).cloned());
        Some(VariantRecord {
            notation,
            coordinate: Some(coordinate),
            identifier,
            annotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnf1b_standards::Standards;

    fn builder(standard: bool) -> VariantDigestBuilder {
        let standards = Standards::embedded().unwrap();
        VariantDigestBuilder::new(standards.sequences, standard)
    }

    #[test]
    fn method_depends_on_chromosome_and_config() {
        assert_eq!(builder(true).method_for("17"), DigestMethod::Standard);
        assert_eq!(builder(true).method_for("3"), DigestMethod::Fallback);
        assert_eq!(builder(false).method_for("17"), DigestMethod::Fallback);
    }

    #[test]
    fn unparseable_hgvs_falls_back_to_genomic_column() {
        let notations = VariantNotations {
            hgvs: Some("NM_000458.4:c.544+1G>T".into()),
            genomic: Some("chr17-37739578-C-T".into()),
            ..Default::default()
        };
        let record = builder(true).build(&notations, None).unwrap();
        assert_eq!(record.notation.source, NotationSource::Hgvs);
        assert!(record.identifier.id().unwrap().starts_with("ga4gh:VA."));
    }

    #[test]
    fn free_text_only_is_unplaced() {
        let notations = VariantNotations {
            free_text: Some("whole gene deletion".into()),
            ..Default::default()
        };
        let record = builder(true).build(&notations, None).unwrap();
        assert_eq!(record.identifier, VariantIdentifier::Unplaced);
        assert!(record.coordinate.is_none());
        assert_eq!(record.notation.value, "whole gene deletion");
    }

    #[test]
    fn no_notation_no_record() {
        assert!(builder(true).build(&VariantNotations::default(), None).is_none());
    }
}
