//! Variant records produced by the digest builder.

use serde::{Deserialize, Serialize};

use crate::coordinate::NormalizedCoordinate;
use crate::row::ChosenNotation;

/// How a variant identifier was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestMethod {
    /// GA4GH VRS computed identifier (sha512t24u over canonical JSON).
    Standard,
    /// Provisional identifier from a simpler hash of the same canonical inputs.
    Fallback,
}

impl DigestMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Fallback => "fallback",
        }
    }
}

/// Content-addressed identifier of a variant, tagged by scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method", content = "id", rename_all = "snake_case")]
pub enum VariantIdentifier {
    Standard(String),
    Fallback(String),
    /// No coordinate could be derived; the variant cannot be placed.
    Unplaced,
}

impl VariantIdentifier {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Standard(id) | Self::Fallback(id) => Some(id),
            Self::Unplaced => None,
        }
    }

    pub fn method(&self) -> Option<DigestMethod> {
        match self {
            Self::Standard(_) => Some(DigestMethod::Standard),
            Self::Fallback(_) => Some(DigestMethod::Fallback),
            Self::Unplaced => None,
        }
    }
}

/// Effect prediction attached from the auxiliary annotation file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAnnotation {
    pub gene: Option<String>,
    pub transcript: Option<String>,
    pub hgvs_c: Option<String>,
    pub hgvs_p: Option<String>,
    pub consequence: Option<String>,
    pub impact: Option<String>,
}

/// A resolved variant for one individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Highest-precedence notation available for the individual.
    pub notation: ChosenNotation,
    pub coordinate: Option<NormalizedCoordinate>,
    pub identifier: VariantIdentifier,
    pub annotation: Option<VariantAnnotation>,
}
