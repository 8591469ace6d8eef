//! TOML configuration.
//!
//! ```toml
//! [ontology]
//! cache_dir = "~/.cache/hnf1b/terms"
//! ttl_days = 30
//! timeout_ms = 5000
//! offline = false
//!
//! [[ontology.providers]]
//! name = "ols4"
//! url_template = "https://www.ebi.ac.uk/ols4/api/terms?obo_id={code}"
//! label_pointer = "/_embedded/terms/0/label"
//!
//! [digest]
//! standard = true
//!
//! [pipeline]
//! workers = 4
//! store_retries = 2
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use hnf1b_core::PipelineOptions;
use hnf1b_ontology::{ProviderConfig, ResolverConfig};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub ontology: OntologySection,
    pub digest: DigestSection,
    pub pipeline: PipelineSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OntologySection {
    pub cache_dir: Option<PathBuf>,
    pub ttl_days: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub offline: Option<bool>,
    /// Replaces the default provider list when present.
    pub providers: Option<Vec<ProviderConfig>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DigestSection {
    pub standard: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub workers: Option<usize>,
    pub store_retries: Option<u32>,
}

/// Flag values that override the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub offline: bool,
    pub no_standard_digest: bool,
    pub workers: Option<usize>,
    pub cache_dir: Option<PathBuf>,
}

/// Effective settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub resolver: ResolverConfig,
    pub standard_digest: bool,
    pub options: PipelineOptions,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Load `path` if given, otherwise the built-in defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn settings(&self, overrides: &Overrides) -> Settings {
        let defaults = ResolverConfig::default();
        let ontology = &self.ontology;
        let resolver = ResolverConfig {
            cache_dir: overrides
                .cache_dir
                .clone()
                .or_else(|| ontology.cache_dir.clone()),
            ttl_days: ontology.ttl_days.unwrap_or(defaults.ttl_days),
            timeout: ontology
                .timeout_ms
                .map_or(defaults.timeout, Duration::from_millis),
            offline: overrides.offline || ontology.offline.unwrap_or(false),
            providers: ontology
                .providers
                .clone()
                .unwrap_or(defaults.providers),
        };

        let mut options = PipelineOptions::default();
        if let Some(workers) = overrides.workers.or(self.pipeline.workers) {
            options.workers = workers;
        }
        if let Some(retries) = self.pipeline.store_retries {
            options.store_retries = retries;
        }

        Settings {
            resolver,
            standard_digest: !overrides.no_standard_digest && self.digest.standard.unwrap_or(true),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config, FileConfig::default());
        let settings = config.settings(&Overrides::default());
        assert!(settings.standard_digest);
        assert!(!settings.resolver.offline);
        assert_eq!(settings.resolver.providers.len(), 2);
        assert_eq!(settings.options.workers, 0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[pipeline]\nthreads = 4\n").is_err());
    }
}
