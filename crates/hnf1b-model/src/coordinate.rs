//! Normalized genomic coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Size difference (in bases) at which a variant counts as a copy-number event.
pub const STRUCTURAL_SIZE_THRESHOLD: u64 = 50;

/// Variant type tag of a normalized coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantType {
    Substitution,
    Deletion,
    Duplication,
    Insertion,
    Indel,
    Unknown,
}

impl VariantType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Substitution => "substitution",
            Self::Deletion => "deletion",
            Self::Duplication => "duplication",
            Self::Insertion => "insertion",
            Self::Indel => "indel",
            Self::Unknown => "unknown",
        }
    }

    /// Short tag used in range notation (`DEL`, `DUP`).
    pub const fn range_tag(&self) -> &'static str {
        match self {
            Self::Substitution => "SUB",
            Self::Deletion => "DEL",
            Self::Duplication => "DUP",
            Self::Insertion => "INS",
            Self::Indel => "DELINS",
            Self::Unknown => "UNK",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification used to pick the canonical representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantClass {
    /// Single-nucleotide variant.
    Snv,
    /// Small insertion/deletion or multi-base substitution.
    Indel,
    /// Structural / copy-number event.
    Structural,
}

impl VariantClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Snv => "snv",
            Self::Indel => "indel",
            Self::Structural => "structural",
        }
    }
}

/// A genomic placement on a named chromosome.
///
/// Positions are 1-based and inclusive. `reference`/`alternate` are both
/// present for allele-level calls. Range events have no `reference`; they
/// carry an `alternate` only when the inserted or replacing bases are
/// known, and insertions keep their two flanking positions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NormalizedCoordinate {
    /// Chromosome name without `chr` prefix (`17`, `X`, `MT`).
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub variant_type: VariantType,
    pub reference: Option<String>,
    pub alternate: Option<String>,
}

impl NormalizedCoordinate {
    /// Build an allele-level coordinate from a position and two alleles.
    pub fn from_alleles(
        chromosome: impl Into<String>,
        position: u64,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Result<Self> {
        let reference = reference.into();
        let alternate = alternate.into();
        let chromosome = chromosome.into();
        if position == 0 || reference.is_empty() {
            return Err(ModelError::Message(format!(
                "allele call on {chromosome} needs a 1-based position and a reference allele"
            )));
        }
        let Some(end) = (reference.len() as u64 - 1).checked_add(position) else {
            return Err(ModelError::Message(format!(
                "allele call on {chromosome} at {position} runs past the last position"
            )));
        };
        let variant_type = allele_variant_type(&reference, &alternate);
        Ok(Self {
            chromosome,
            start: position,
            end,
            variant_type,
            reference: Some(reference),
            alternate: Some(alternate),
        })
    }

    /// Build a range event (`17:36459258-37832869:DEL`).
    pub fn from_range(
        chromosome: impl Into<String>,
        start: u64,
        end: u64,
        variant_type: VariantType,
    ) -> Result<Self> {
        let chromosome = chromosome.into();
        if start == 0 || start > end {
            return Err(ModelError::InvalidCoordinate {
                chromosome,
                start,
                end,
            });
        }
        Ok(Self {
            chromosome,
            start,
            end,
            variant_type,
            reference: None,
            alternate: None,
        })
    }

    /// Attach the inserted or replacing sequence of a range event
    /// (`g.100_101insATG`, `g.100_102delinsTT`, `g.100_101dupAG`).
    pub fn with_alternate(mut self, alternate: impl Into<String>) -> Self {
        self.alternate = Some(alternate.into());
        self
    }

    /// Number of reference bases spanned.
    pub fn span(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn class(&self) -> VariantClass {
        let size_class = |diff: u64| {
            if diff >= STRUCTURAL_SIZE_THRESHOLD {
                VariantClass::Structural
            } else {
                VariantClass::Indel
            }
        };
        match (&self.reference, &self.alternate) {
            (Some(reference), Some(alternate)) => {
                if reference.len() == 1 && alternate.len() == 1 {
                    VariantClass::Snv
                } else {
                    size_class(reference.len().abs_diff(alternate.len()) as u64)
                }
            }
            (_, Some(alternate)) => match self.variant_type {
                // Nothing is removed; the sequence is added.
                VariantType::Insertion | VariantType::Duplication => {
                    size_class(alternate.len() as u64)
                }
                _ => size_class(self.span().abs_diff(alternate.len() as u64)),
            },
            // A sequence-less deletion or duplication removes or adds its span.
            (_, None) => size_class(self.span()),
        }
    }

    pub fn is_structural(&self) -> bool {
        self.class() == VariantClass::Structural
    }

    /// Bases asserted in place of the reference for range events, if known.
    ///
    /// Deletions assert the empty sequence.
    pub fn range_sequence(&self) -> Option<&str> {
        match (&self.reference, &self.alternate) {
            (None, Some(alternate)) => Some(alternate),
            (None, None) if self.variant_type == VariantType::Deletion => Some(""),
            _ => None,
        }
    }

    /// Stable lookup key, independent of the notation it was parsed from.
    ///
    /// Allele calls: `17-37739578-C-T`. Range events: `17-36459258-37832869-DEL`,
    /// with the asserted sequence appended when known (`17-100-101-INS-ATG`).
    pub fn key(&self) -> String {
        match (&self.reference, &self.alternate) {
            (Some(reference), Some(alternate)) => format!(
                "{}-{}-{}-{}",
                self.chromosome, self.start, reference, alternate
            ),
            (None, Some(alternate)) => format!(
                "{}-{}-{}-{}-{}",
                self.chromosome,
                self.start,
                self.end,
                self.variant_type.range_tag(),
                alternate
            ),
            _ => format!(
                "{}-{}-{}-{}",
                self.chromosome,
                self.start,
                self.end,
                self.variant_type.range_tag()
            ),
        }
    }
}

impl fmt::Display for NormalizedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.reference, &self.alternate) {
            (Some(reference), Some(alternate)) => write!(
                f,
                "chr{}:{} {}>{}",
                self.chromosome, self.start, reference, alternate
            ),
            (None, Some(alternate)) => write!(
                f,
                "chr{}:{}-{} {} {}",
                self.chromosome,
                self.start,
                self.end,
                self.variant_type.range_tag(),
                alternate
            ),
            _ => write!(
                f,
                "chr{}:{}-{} {}",
                self.chromosome,
                self.start,
                self.end,
                self.variant_type.range_tag()
            ),
        }
    }
}

/// Type tag implied by a VCF-style reference/alternate pair.
fn allele_variant_type(reference: &str, alternate: &str) -> VariantType {
    let (r, a) = (reference.len(), alternate.len());
    if r == a {
        VariantType::Substitution
    } else if a < r && reference.starts_with(alternate) {
        VariantType::Deletion
    } else if r < a && alternate.starts_with(reference) {
        // Inserted bases copying the bases just before them form a tandem duplication.
        let inserted = &alternate[r..];
        if inserted.len() <= r && reference.ends_with(inserted) {
            VariantType::Duplication
        } else {
            VariantType::Insertion
        }
    } else {
        VariantType::Indel
    }
}
