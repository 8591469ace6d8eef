//! Remote label providers (resolver tier 3).

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{OntologyError, ProviderError};

/// A remote source that maps a term code to its label.
///
/// Implementations must honour `timeout`; the resolver never waits on a
/// provider longer than that.
pub trait LabelProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_label(&self, code: &str, timeout: Duration) -> Result<String, ProviderError>;
}

/// HTTP GET provider driven by a [`ProviderConfig`].
pub struct HttpLabelProvider {
    config: ProviderConfig,
    client: Client,
}

impl HttpLabelProvider {
    pub fn new(config: ProviderConfig) -> crate::error::Result<Self> {
        if !config.label_pointer.is_empty() && !config.label_pointer.starts_with('/') {
            return Err(OntologyError::InvalidProvider {
                name: config.name,
                message: "label_pointer must be empty or start with '/'".to_string(),
            });
        }
        let client = Client::builder().build().map_err(OntologyError::Client)?;
        Ok(Self { config, client })
    }
}

impl LabelProvider for HttpLabelProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn fetch_label(&self, code: &str, timeout: Duration) -> Result<String, ProviderError> {
        let provider = self.config.name.clone();
        let url = self.config.url_for(code);
        debug!(provider = %provider, url = %url, "Fetching term label");

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .header(USER_AGENT, format!("hnf1b-phenopackets/{}", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|source| network_error(&provider, source))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ProviderError::NotFound {
                provider,
                code: code.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider,
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|source| network_error(&provider, source))?;
        extract_label(&provider, code, &body, &self.config.label_pointer)
    }
}

fn network_error(provider: &str, source: reqwest::Error) -> ProviderError {
    if source.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
        }
    } else if source.is_decode() {
        ProviderError::Malformed {
            provider: provider.to_string(),
            message: source.to_string(),
        }
    } else {
        ProviderError::Network {
            provider: provider.to_string(),
            source,
        }
    }
}

/// Pull a non-empty label string out of a provider response.
pub fn extract_label(
    provider: &str,
    code: &str,
    body: &serde_json::Value,
    pointer: &str,
) -> Result<String, ProviderError> {
    let value = body.pointer(pointer).ok_or_else(|| ProviderError::NotFound {
        provider: provider.to_string(),
        code: code.to_string(),
    })?;
    let label = value.as_str().ok_or_else(|| ProviderError::Malformed {
        provider: provider.to_string(),
        message: format!("value at {pointer} is not a string"),
    })?;
    let label = label.trim();
    if label.is_empty() {
        return Err(ProviderError::Malformed {
            provider: provider.to_string(),
            message: "empty label".to_string(),
        });
    }
    Ok(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_ols_label() {
        let body = json!({"_embedded": {"terms": [{"label": "Renal cyst", "obo_id": "HP:0000107"}]}});
        let label = extract_label("ols4", "HP:0000107", &body, "/_embedded/terms/0/label").unwrap();
        assert_eq!(label, "Renal cyst");
    }

    #[test]
    fn empty_and_missing_labels_fail() {
        let body = json!({"name": "  "});
        assert!(matches!(
            extract_label("jax", "HP:1", &body, "/name"),
            Err(ProviderError::Malformed { .. })
        ));
        assert!(matches!(
            extract_label("jax", "HP:1", &json!({}), "/name"),
            Err(ProviderError::NotFound { .. })
        ));
    }

    #[test]
    fn rejects_relative_pointer() {
        let config = ProviderConfig {
            name: "bad".into(),
            url_template: "http://localhost/{code}".into(),
            label_pointer: "label".into(),
        };
        assert!(HttpLabelProvider::new(config).is_err());
    }
}
