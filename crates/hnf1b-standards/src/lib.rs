#![deny(unsafe_code)]

//! Curated lookup tables for HNF1B phenopacket normalization.
//!
//! Tables ship embedded in the binary. A directory holding any subset of the
//! table files (see [`embedded::TABLE_FILES`]) overrides the embedded copies,
//! either passed explicitly or through `HNF1B_STANDARDS_DIR`.

pub mod embedded;
pub mod error;
pub mod tables;

use std::path::{Path, PathBuf};

pub use crate::error::{Result, StandardsError};
pub use crate::tables::{
    FeatureColumn, FeatureHandler, FeatureRegistry, ModifierTable, OnsetTable, ResourceTable,
    SequenceEntry, SequenceRegistry, StagingTable, TermTable, compact_key, phrase_key,
};

/// Environment variable for overriding the embedded tables.
pub const STANDARDS_ENV_VAR: &str = "HNF1B_STANDARDS_DIR";

/// Every curated table the pipeline consults.
#[derive(Debug, Clone)]
pub struct Standards {
    pub terms: TermTable,
    pub staging: StagingTable,
    pub onsets: OnsetTable,
    pub modifiers: ModifierTable,
    pub features: FeatureRegistry,
    pub sequences: SequenceRegistry,
    pub resources: ResourceTable,
}

impl Standards {
    /// Tables compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::parse_all(|name| Ok(embedded_table(name).to_string()))
    }

    /// Tables from `dir`; files missing there fall back to the embedded copy.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::parse_all(|name| {
            let path = dir.join(name);
            if path.is_file() {
                std::fs::read_to_string(&path).map_err(|source| StandardsError::io(path, source))
            } else {
                Ok(embedded_table(name).to_string())
            }
        })
    }

    /// `HNF1B_STANDARDS_DIR` if set, otherwise the embedded tables.
    pub fn load_default() -> Result<Self> {
        match standards_override_dir() {
            Some(dir) => Self::load_from_dir(&dir),
            None => Self::embedded(),
        }
    }

    fn parse_all(mut read: impl FnMut(&str) -> Result<String>) -> Result<Self> {
        Ok(Self {
            terms: TermTable::parse(&read("terms.csv")?)?,
            staging: StagingTable::parse(&read("renal_stages.csv")?)?,
            onsets: OnsetTable::parse(&read("onset_terms.csv")?)?,
            modifiers: ModifierTable::parse(&read("modifiers.csv")?)?,
            features: FeatureRegistry::parse(&read("phenotype_columns.csv")?)?,
            sequences: SequenceRegistry::parse(&read("sequences.csv")?)?,
            resources: ResourceTable::parse(&read("resources.csv")?)?,
        })
    }
}

/// Override directory from the environment, if set and non-empty.
pub fn standards_override_dir() -> Option<PathBuf> {
    std::env::var(STANDARDS_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn embedded_table(name: &str) -> &'static str {
    match name {
        "terms.csv" => embedded::TERMS,
        "renal_stages.csv" => embedded::RENAL_STAGES,
        "onset_terms.csv" => embedded::ONSET_TERMS,
        "modifiers.csv" => embedded::MODIFIERS,
        "phenotype_columns.csv" => embedded::PHENOTYPE_COLUMNS,
        "sequences.csv" => embedded::SEQUENCES,
        "resources.csv" => embedded::RESOURCES,
        _ => "",
    }
}
