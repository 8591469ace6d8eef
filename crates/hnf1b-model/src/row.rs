//! Typed spreadsheet rows.
//!
//! A [`SourceRow`] is produced by the ingestion mapping step. Downstream
//! components read its fields directly and never look at raw headers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column family a variant notation was read from.
///
/// Variant order is the selection precedence: earlier variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotationSource {
    /// Standards-aligned HGVS notation.
    Hgvs,
    /// Raw genomic coordinate (`chr17-37739578-C-T`, `17:36459258-37832869:DEL`).
    Genomic,
    /// Free-text description as reported in the publication.
    FreeText,
}

impl NotationSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hgvs => "hgvs",
            Self::Genomic => "genomic",
            Self::FreeText => "free_text",
        }
    }

    /// All sources in precedence order.
    pub const fn precedence() -> &'static [NotationSource] {
        &[Self::Hgvs, Self::Genomic, Self::FreeText]
    }
}

impl fmt::Display for NotationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A variant notation selected for an individual, with the column it came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChosenNotation {
    pub source: NotationSource,
    pub value: String,
}

/// The competing variant notation columns of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantNotations {
    /// HGVS expression (`NM_000458.4:c.544+1G>T`, `NC_000017.11:g.37739578C>T`).
    pub hgvs: Option<String>,
    /// Raw genomic coordinate string.
    pub genomic: Option<String>,
    /// VCF INFO string accompanying symbolic genomic alleles (`SVTYPE=DEL;END=...`).
    pub vcf_info: Option<String>,
    /// Free-text variant description.
    pub free_text: Option<String>,
}

impl VariantNotations {
    /// Value stored for the given source, if non-blank.
    pub fn get(&self, source: NotationSource) -> Option<&str> {
        let value = match source {
            NotationSource::Hgvs => self.hgvs.as_deref(),
            NotationSource::Genomic => self.genomic.as_deref(),
            NotationSource::FreeText => self.free_text.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        NotationSource::precedence()
            .iter()
            .all(|source| self.get(*source).is_none())
    }

    /// Highest-precedence notation present in this row.
    pub fn preferred(&self) -> Option<ChosenNotation> {
        NotationSource::precedence().iter().find_map(|source| {
            self.get(*source).map(|value| ChosenNotation {
                source: *source,
                value: value.to_string(),
            })
        })
    }
}

/// Phenopacket sex values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Female,
    Male,
    OtherSex,
    #[default]
    UnknownSex,
}

impl Sex {
    /// Parse a free-text sex value. Unrecognized text maps to `UnknownSex`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "f" | "female" | "woman" | "girl" | "w" => Self::Female,
            "m" | "male" | "man" | "boy" => Self::Male,
            "other" | "intersex" | "other_sex" => Self::OtherSex,
            _ => Self::UnknownSex,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::UnknownSex)
    }
}

/// One spreadsheet record after header mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    /// 1-based data row number in the source sheet (for diagnostics only).
    pub row_number: usize,
    /// Raw individual identifier as typed by the curator.
    pub individual_key: String,
    pub sex: Option<String>,
    pub age_onset: Option<String>,
    pub age_reported: Option<String>,
    pub review_date: Option<String>,
    /// Publication alias (e.g. `smith2019`).
    pub publication: Option<String>,
    pub variant: VariantNotations,
    pub transcript: Option<String>,
    /// Already-assigned ACMG classification, passed through unchanged.
    pub classification: Option<String>,
    pub zygosity: Option<String>,
    pub inheritance: Option<String>,
    /// Clinical values keyed by feature key from the phenotype column registry.
    pub clinical: BTreeMap<String, String>,
}

impl SourceRow {
    /// Returns a clinical value by feature key, trimmed and non-empty.
    pub fn clinical_value(&self, feature_key: &str) -> Option<&str> {
        self.clinical
            .get(feature_key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Trim a field and drop it when blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
