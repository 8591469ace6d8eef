//! Resolver configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default lifetime of a disk cache entry.
pub const DEFAULT_TTL_DAYS: u32 = 30;

/// Default per-request timeout for remote providers.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// One remote label source.
///
/// `url_template` may contain `{code}` (`HP:0000107`) and `{iri_code}`
/// (`HP_0000107`). `label_pointer` is a JSON pointer into the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub url_template: String,
    pub label_pointer: String,
}

impl ProviderConfig {
    /// EBI Ontology Lookup Service, any OBO ontology.
    pub fn ols4() -> Self {
        Self {
            name: "ols4".to_string(),
            url_template: "https://www.ebi.ac.uk/ols4/api/terms?obo_id={code}".to_string(),
            label_pointer: "/_embedded/terms/0/label".to_string(),
        }
    }

    /// JAX HPO API, HPO terms only.
    pub fn jax() -> Self {
        Self {
            name: "jax".to_string(),
            url_template: "https://ontology.jax.org/api/hp/terms/{code}".to_string(),
            label_pointer: "/name".to_string(),
        }
    }

    /// Request URL for `code`.
    pub fn url_for(&self, code: &str) -> String {
        self.url_template
            .replace("{code}", code)
            .replace("{iri_code}", &code.replace(':', "_"))
    }
}

/// Settings for [`crate::OntologyResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Disk cache directory; `None` disables tier 2.
    pub cache_dir: Option<PathBuf>,
    pub ttl_days: u32,
    pub timeout: Duration,
    /// Skip remote providers entirely.
    pub offline: bool,
    /// Remote providers in priority order.
    pub providers: Vec<ProviderConfig>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            ttl_days: DEFAULT_TTL_DAYS,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            offline: false,
            providers: vec![ProviderConfig::ols4(), ProviderConfig::jax()],
        }
    }
}

impl ResolverConfig {
    /// Configuration that never touches the network or disk.
    pub fn offline() -> Self {
        Self {
            offline: true,
            providers: Vec::new(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_template_substitution() {
        let provider = ProviderConfig {
            name: "obo".into(),
            url_template: "http://purl.obolibrary.org/obo/{iri_code}?q={code}".into(),
            label_pointer: "/label".into(),
        };
        assert_eq!(
            provider.url_for("HP:0000107"),
            "http://purl.obolibrary.org/obo/HP_0000107?q=HP:0000107"
        );
    }
}
