//! Embedded standards data.
//!
//! All curated tables are embedded at compile time using `include_str!()`,
//! so the pipeline works without any files next to the binary.

/// Static term label table (resolver tier 4).
pub const TERMS: &str = include_str!("../data/terms.csv");

/// Renal insufficiency staging table.
pub const RENAL_STAGES: &str = include_str!("../data/renal_stages.csv");

/// Developmental-stage onset terms.
pub const ONSET_TERMS: &str = include_str!("../data/onset_terms.csv");

/// Phenotype modifiers (laterality, severity, progression).
pub const MODIFIERS: &str = include_str!("../data/modifiers.csv");

/// Phenotype column registry.
pub const PHENOTYPE_COLUMNS: &str = include_str!("../data/phenotype_columns.csv");

/// Chromosome to RefSeq / refget accession registry (GRCh38).
pub const SEQUENCES: &str = include_str!("../data/sequences.csv");

/// Ontology resources cited in `metaData`.
pub const RESOURCES: &str = include_str!("../data/resources.csv");

/// File names of the tables, used when loading an override directory.
pub const TABLE_FILES: &[&str] = &[
    "terms.csv",
    "renal_stages.csv",
    "onset_terms.csv",
    "modifiers.csv",
    "phenotype_columns.csv",
    "sequences.csv",
    "resources.csv",
];
