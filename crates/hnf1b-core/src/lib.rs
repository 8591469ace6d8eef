#![deny(unsafe_code)]

//! HNF1B phenopacket normalization.
//!
//! Components, in the order a group of rows passes through them:
//! [`consolidate`] → [`features`] (with [`temporal`] and the ontology
//! resolver) → [`variant`] (with [`coordinate`] and [`vrs`]) →
//! [`assemble`] → [`store`]. [`pipeline`] runs them over a row source.

pub mod assemble;
pub mod audit;
pub mod consolidate;
pub mod coordinate;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod store;
pub mod temporal;
pub mod variant;
pub mod vrs;

pub use assemble::{DocumentAssembler, EVIDENCE_CODE, allelic_state_code, content_digest, record_id};
pub use audit::{AuditEvent, AuditKind, AuditLog};
pub use consolidate::{
    ClinicalValue, ConsolidatedIndividual, IndividualGroup, consolidate, group_rows,
    normalize_individual_key,
};
pub use coordinate::{normalize_chromosome, parse_coordinate, parse_coordinate_with_info};
pub use error::{PipelineError, Result, StoreError};
pub use features::{
    CKD_DISEASE, DOMAIN_DISEASE, ExtractedClinical, ExtractedFeature, FeatureExtractor,
    ValueStatus, classify_value,
};
pub use pipeline::{
    CancellationToken, DEFAULT_CREATED_BY, GroupFailure, GroupState, Pipeline, PipelineOptions,
    RunReport, RunSummary,
};
pub use store::{DirectoryStore, JsonFileWriter, RecordStore, store_with_retry};
pub use temporal::{
    AgeDuration, TemporalValue, is_not_reported, parse_age, parse_review_date, parse_temporal,
};
pub use variant::VariantDigestBuilder;
