pub mod coordinate;
pub mod error;
pub mod phenopacket;
pub mod row;
pub mod term;
pub mod variant;

pub use coordinate::{NormalizedCoordinate, STRUCTURAL_SIZE_THRESHOLD, VariantClass, VariantType};
pub use error::{ModelError, Result};
pub use phenopacket::{
    AcmgClassification, Age, Diagnosis, Disease, Evidence, Expression, Extension,
    ExternalReference, GeneDescriptor, GenomicInterpretation, Individual, Interpretation,
    InterpretationStatus, MetaData, PHENOPACKET_SCHEMA_VERSION, Phenopacket, PhenotypicFeature,
    ProgressStatus, Resource, TimeElement, Update, VariantInterpretation, VariationDescriptor,
    VcfRecord,
};
pub use row::{ChosenNotation, NotationSource, Sex, SourceRow, VariantNotations, non_blank};
pub use term::{OntologyClass, ResolutionTier, ResolvedTerm, normalize_term_code, placeholder_label};
pub use variant::{DigestMethod, VariantAnnotation, VariantIdentifier, VariantRecord};
