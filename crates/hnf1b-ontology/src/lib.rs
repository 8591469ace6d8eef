#![deny(unsafe_code)]

//! Ontology term resolution.
//!
//! Lookups consult, in order and only on a miss: an in-process memory
//! cache, an on-disk JSON cache with a TTL, remote label providers, the
//! curated static table, and finally a placeholder label. Successful
//! lookups are written back to the faster tiers.

pub mod config;
pub mod disk;
pub mod error;
pub mod provider;
pub mod resolver;

pub use config::{DEFAULT_TIMEOUT_MS, DEFAULT_TTL_DAYS, ProviderConfig, ResolverConfig};
pub use disk::{CacheEntry, DiskCache};
pub use error::{OntologyError, ProviderError, Result};
pub use provider::{HttpLabelProvider, LabelProvider, extract_label};
pub use resolver::{OntologyResolver, ResolverStats};
