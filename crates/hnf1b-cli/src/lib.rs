//! CLI library components for the HNF1B phenopacket pipeline.

#![allow(missing_docs)]

pub mod config;
pub mod logging;
