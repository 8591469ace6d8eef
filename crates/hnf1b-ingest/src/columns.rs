//! Header recognition.
//!
//! Curated sheets spell the same column many ways (`individual_id`,
//! `IndividualIdentifier`, `Individual`). Headers are compared on their
//! compact form, so case, spacing and punctuation never matter.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use hnf1b_standards::{FeatureRegistry, compact_key};

/// Non-clinical fields of a [`hnf1b_model::SourceRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoreField {
    IndividualKey,
    Sex,
    AgeOnset,
    AgeReported,
    ReviewDate,
    Publication,
    Hgvs,
    Genomic,
    VcfInfo,
    FreeTextVariant,
    Transcript,
    Classification,
    Zygosity,
    Inheritance,
}

impl CoreField {
    pub const ALL: [CoreField; 14] = [
        Self::IndividualKey,
        Self::Sex,
        Self::AgeOnset,
        Self::AgeReported,
        Self::ReviewDate,
        Self::Publication,
        Self::Hgvs,
        Self::Genomic,
        Self::VcfInfo,
        Self::FreeTextVariant,
        Self::Transcript,
        Self::Classification,
        Self::Zygosity,
        Self::Inheritance,
    ];

    /// Canonical column name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::IndividualKey => "individual_id",
            Self::Sex => "sex",
            Self::AgeOnset => "age_onset",
            Self::AgeReported => "age_reported",
            Self::ReviewDate => "review_date",
            Self::Publication => "publication",
            Self::Hgvs => "hgvs",
            Self::Genomic => "genomic_coordinate",
            Self::VcfInfo => "vcf_info",
            Self::FreeTextVariant => "variant_reported",
            Self::Transcript => "transcript",
            Self::Classification => "classification",
            Self::Zygosity => "zygosity",
            Self::Inheritance => "inheritance",
        }
    }

    /// Accepted header spellings besides the canonical name.
    pub const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::IndividualKey => &[
                "IndividualIdentifier",
                "Individual",
                "individual_key",
                "patient_id",
                "Patient",
                "subject_id",
            ],
            Self::Sex => &["Gender", "ReportedSex"],
            Self::AgeOnset => &["AgeOnset", "age_at_onset", "onset_age", "OnsetAge"],
            Self::AgeReported => &[
                "AgeReported",
                "age",
                "age_at_report",
                "age_last_encounter",
                "ReportedAge",
            ],
            Self::ReviewDate => &["ReviewDate", "reviewed", "date_reviewed", "ReviewedDate"],
            Self::Publication => &["Publication", "publication_alias", "PublicationAlias", "reference"],
            Self::Hgvs => &["hgvs_g", "hgvs_notation", "VariantHgvs", "varsome", "standardized_variant"],
            Self::Genomic => &[
                "genomic",
                "vcf",
                "vcf_call",
                "variant_coordinate",
                "Coordinates",
                "cnv_coordinates",
            ],
            Self::VcfInfo => &["info", "vcf_info_field", "sv_info"],
            Self::FreeTextVariant => &[
                "variant",
                "reported_variant",
                "variant_description",
                "VariantReported",
            ],
            Self::Transcript => &["TranscriptId", "refseq_transcript"],
            Self::Classification => &[
                "acmg",
                "acmg_classification",
                "verdict",
                "VerdictClassification",
                "pathogenicity",
            ],
            Self::Zygosity => &["Zygosity", "allelic_state"],
            Self::Inheritance => &["segregation", "mode_of_inheritance", "Inheritance"],
        }
    }
}

/// Where a source column's values go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    Core(CoreField),
    /// Clinical column, by feature key.
    Clinical(String),
}

/// Resolved mapping from header positions to row fields.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    targets: Vec<Option<ColumnTarget>>,
    unmapped: Vec<String>,
}

impl ColumnMapping {
    /// Map `headers` against the core aliases and the phenotype registry.
    ///
    /// Core fields win over clinical columns; when two headers map to the same
    /// target only the first is used.
    pub fn from_headers<S: AsRef<str>>(headers: &[S], registry: &FeatureRegistry) -> Self {
        let core_lookup = core_alias_lookup();
        let mut claimed: Vec<ColumnTarget> = Vec::new();
        let mut targets = Vec::with_capacity(headers.len());
        let mut unmapped = Vec::new();

        for header in headers {
            let header = header.as_ref().trim().trim_start_matches('\u{feff}');
            let key = compact_key(header);
            let target = core_lookup
                .get(&key)
                .map(|field| ColumnTarget::Core(*field))
                .or_else(|| {
                    registry
                        .match_header(header)
                        .map(|column| ColumnTarget::Clinical(column.key.clone()))
                });

            match target {
                Some(target) if claimed.contains(&target) => {
                    warn!(header, ?target, "Duplicate column ignored");
                    targets.push(None);
                }
                Some(target) => {
                    debug!(header, ?target, "Mapped column");
                    claimed.push(target.clone());
                    targets.push(Some(target));
                }
                None => {
                    if !header.is_empty() {
                        unmapped.push(header.to_string());
                    }
                    targets.push(None);
                }
            }
        }

        Self { targets, unmapped }
    }

    pub fn target(&self, index: usize) -> Option<&ColumnTarget> {
        self.targets.get(index).and_then(Option::as_ref)
    }

    pub fn has(&self, field: CoreField) -> bool {
        self.targets
            .iter()
            .flatten()
            .any(|target| *target == ColumnTarget::Core(field))
    }

    /// Feature keys of the clinical columns present.
    pub fn clinical_keys(&self) -> Vec<&str> {
        self.targets
            .iter()
            .flatten()
            .filter_map(|target| match target {
                ColumnTarget::Clinical(key) => Some(key.as_str()),
                ColumnTarget::Core(_) => None,
            })
            .collect()
    }

    /// Headers nothing recognized, in sheet order.
    pub fn unmapped(&self) -> &[String] {
        &self.unmapped
    }
}

fn core_alias_lookup() -> BTreeMap<String, CoreField> {
    let mut lookup = BTreeMap::new();
    for field in CoreField::ALL {
        lookup.insert(compact_key(field.name()), field);
        for alias in field.aliases() {
            lookup.insert(compact_key(alias), field);
        }
    }
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_do_not_collide() {
        let mut seen = BTreeMap::new();
        for field in CoreField::ALL {
            for name in field.aliases().iter().chain(std::iter::once(&field.name())) {
                if let Some(previous) = seen.insert(compact_key(name), field) {
                    assert_eq!(previous, field, "alias {name} claimed twice");
                }
            }
        }
    }
}
