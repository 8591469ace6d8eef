//! Ontology term values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A coded ontology concept with its label, as written into phenopackets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OntologyClass {
    pub id: String,
    pub label: String,
}

impl OntologyClass {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Ontology prefix (`HP` for `HP:0000107`).
    pub fn prefix(&self) -> &str {
        self.id.split(':').next().unwrap_or("")
    }
}

/// Lookup tier that produced a [`ResolvedTerm`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum ResolutionTier {
    Memory,
    Disk,
    Remote { provider: String },
    Static,
    Placeholder,
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Disk => f.write_str("disk"),
            Self::Remote { provider } => write!(f, "remote:{provider}"),
            Self::Static => f.write_str("static"),
            Self::Placeholder => f.write_str("placeholder"),
        }
    }
}

/// The result of resolving a term code to its canonical label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTerm {
    pub code: String,
    pub label: String,
    /// Tier that answered the lookup.
    pub tier: ResolutionTier,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedTerm {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.tier, ResolutionTier::Placeholder)
    }

    pub fn to_class(&self) -> OntologyClass {
        OntologyClass::new(&self.code, &self.label)
    }
}

/// Label used when no tier knows a code.
pub fn placeholder_label(code: &str) -> String {
    format!("Unknown term ({code})")
}

/// Normalize an ontology CURIE: uppercase prefix, `_` separator accepted.
///
/// `hp:0000107`, `HP_0000107` and ` HP:0000107 ` all become `HP:0000107`.
/// Strings without a recognizable prefix are returned trimmed.
pub fn normalize_term_code(raw: &str) -> String {
    let trimmed = raw.trim();
    let split = trimmed
        .find(':')
        .or_else(|| trimmed.find('_'))
        .filter(|idx| *idx > 0);
    match split {
        Some(idx) => {
            let (prefix, rest) = trimmed.split_at(idx);
            let local = rest[1..].trim();
            if prefix.chars().all(|c| c.is_ascii_alphabetic()) && !local.is_empty() {
                format!("{}:{}", prefix.to_ascii_uppercase(), local)
            } else {
                trimmed.to_string()
            }
        }
        None => trimmed.to_string(),
    }
}
