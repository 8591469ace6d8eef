//! GA4GH VRS canonical forms and computed identifiers.

pub mod digest;
pub mod models;

pub use digest::{
    canonical_json, fallback_identifier, ga4gh_identifier, sha512t24u, variation_json,
};
pub use models::{
    Allele, CopyChange, CopyNumberChange, SequenceLocation, SequenceReference, VrsVariation,
    trim_alleles,
};
