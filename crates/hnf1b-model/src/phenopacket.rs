//! GA4GH Phenopacket v2 document model.
//!
//! Only the parts of the schema this pipeline writes are modelled. Field
//! names serialize in the camelCase JSON form of the schema, and empty
//! lists/absent options are omitted so that documents stay byte-stable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::row::Sex;
use crate::term::OntologyClass;

/// Phenopacket schema version written into `metaData`.
pub const PHENOPACKET_SCHEMA_VERSION: &str = "2.0";

/// The canonical record emitted for one individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phenopacket {
    pub id: String,
    pub subject: Individual,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phenotypic_features: Vec<PhenotypicFeature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diseases: Vec<Disease>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretations: Vec<Interpretation>,
    pub meta_data: MetaData,
}

impl Phenopacket {
    pub fn has_features(&self) -> bool {
        !self.phenotypic_features.is_empty()
    }

    pub fn has_variants(&self) -> bool {
        self.interpretations
            .iter()
            .any(|i| !i.diagnosis.genomic_interpretations.is_empty())
    }

    pub fn has_diseases(&self) -> bool {
        !self.diseases.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    pub id: String,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_at_last_encounter: Option<TimeElement>,
}

/// An ISO 8601 age.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Age {
    pub iso8601duration: String,
}

/// Age or developmental stage at which something applies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeElement {
    Age(Age),
    OntologyClass(OntologyClass),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhenotypicFeature {
    #[serde(rename = "type")]
    pub kind: OntologyClass,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<OntologyClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<TimeElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub evidence_code: OntologyClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ExternalReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    pub term: OntologyClass,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub excluded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<TimeElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disease_stage: Vec<OntologyClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub id: String,
    pub progress_status: ProgressStatus,
    pub diagnosis: Diagnosis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    UnknownProgress,
    InProgress,
    Completed,
    Solved,
    Unsolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub disease: OntologyClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genomic_interpretations: Vec<GenomicInterpretation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenomicInterpretation {
    pub subject_or_biosample_id: String,
    pub interpretation_status: InterpretationStatus,
    pub variant_interpretation: VariantInterpretation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterpretationStatus {
    UnknownStatus,
    Rejected,
    Candidate,
    Contributory,
    Causative,
}

/// ACMG pathogenicity class, passed through from curation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcmgClassification {
    #[default]
    NotProvided,
    Benign,
    LikelyBenign,
    UncertainSignificance,
    LikelyPathogenic,
    Pathogenic,
}

impl AcmgClassification {
    /// Parse curated classification text (`Pathogenic`, `likely pathogenic`,
    /// `LP`, `VUS`, `class 5`). Unknown text maps to `NotProvided`.
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .to_uppercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        match key.trim_matches('_') {
            "PATHOGENIC" | "P" | "CLASS_5" | "5" => Self::Pathogenic,
            "LIKELY_PATHOGENIC" | "LP" | "CLASS_4" | "4" => Self::LikelyPathogenic,
            "UNCERTAIN_SIGNIFICANCE" | "VUS" | "UNCERTAIN" | "CLASS_3" | "3" => {
                Self::UncertainSignificance
            }
            "LIKELY_BENIGN" | "LB" | "CLASS_2" | "2" => Self::LikelyBenign,
            "BENIGN" | "B" | "CLASS_1" | "1" => Self::Benign,
            _ => Self::NotProvided,
        }
    }

    /// Interpretation status implied by the assigned class.
    pub fn interpretation_status(&self) -> InterpretationStatus {
        match self {
            Self::Pathogenic | Self::LikelyPathogenic => InterpretationStatus::Causative,
            Self::UncertainSignificance => InterpretationStatus::Candidate,
            Self::Benign | Self::LikelyBenign => InterpretationStatus::Rejected,
            Self::NotProvided => InterpretationStatus::UnknownStatus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInterpretation {
    pub acmg_pathogenicity_classification: AcmgClassification,
    pub variation_descriptor: VariationDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationDescriptor {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_context: Option<GeneDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcf_record: Option<VcfRecord>,
    pub molecule_context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_type: Option<OntologyClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allelic_state: Option<OntologyClass>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneDescriptor {
    pub value_id: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Expression {
    pub syntax: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcfRecord {
    pub genome_assembly: String,
    pub chrom: String,
    pub pos: u64,
    #[serde(rename = "ref")]
    pub reference: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    /// Creation time. Excluded from content comparison and digests.
    pub created: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<Update>,
    pub phenopacket_schema_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_references: Vec<ExternalReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub url: String,
    pub version: String,
    pub namespace_prefix: String,
    pub iri_prefix: String,
}

/// Curation review event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub timestamp: NaiveDate,
    pub comment: String,
}
