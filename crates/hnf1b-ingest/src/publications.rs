//! Publication alias table (`alias,pmid,doi,title,year`).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use hnf1b_model::ExternalReference;

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Publication {
    pub alias: String,
    #[serde(default)]
    pub pmid: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl Publication {
    /// Citation as an external reference: PMID when known, else DOI.
    pub fn external_reference(&self) -> Option<ExternalReference> {
        if let Some(pmid) = self.pmid.as_deref().map(normalize_pmid).filter(|p| !p.is_empty()) {
            return Some(ExternalReference {
                id: format!("PMID:{pmid}"),
                reference: Some(format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}")),
                description: self.title.clone(),
            });
        }
        let doi = self.doi.as_deref().map(normalize_doi).filter(|d| !d.is_empty())?;
        Some(ExternalReference {
            id: format!("DOI:{doi}"),
            reference: Some(format!("https://doi.org/{doi}")),
            description: self.title.clone(),
        })
    }
}

fn normalize_pmid(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("PMID:")
        .or_else(|| trimmed.strip_prefix("pmid:"))
        .unwrap_or(trimmed);
    trimmed.trim().to_string()
}

fn normalize_doi(raw: &str) -> String {
    let trimmed = raw.trim();
    ["https://doi.org/", "http://doi.org/", "doi:", "DOI:"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Normalized lookup form of a publication alias.
pub fn alias_key(alias: &str) -> String {
    alias.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct PublicationTable {
    by_alias: BTreeMap<String, Publication>,
}

impl PublicationTable {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path)
    }

    pub fn from_reader<R: Read>(reader: R, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut by_alias = BTreeMap::new();
        for (idx, record) in reader.deserialize::<Publication>().enumerate() {
            let publication = record.map_err(|source| IngestError::Csv {
                path: path.clone(),
                source,
            })?;
            if publication.alias.trim().is_empty() {
                return Err(IngestError::InvalidRow {
                    path,
                    row: idx + 1,
                    message: "publication alias is empty".to_string(),
                });
            }
            by_alias.insert(alias_key(&publication.alias), publication);
        }
        info!(path = %path.display(), publications = by_alias.len(), "Loaded publications");
        Ok(Self { by_alias })
    }

    pub fn get(&self, alias: &str) -> Option<&Publication> {
        self.by_alias.get(&alias_key(alias))
    }

    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pmid_preferred_over_doi() {
        let publication = Publication {
            alias: "smith2019".into(),
            pmid: Some("PMID:31234567".into()),
            doi: Some("10.1000/xyz".into()),
            title: None,
            year: Some(2019),
        };
        let reference = publication.external_reference().unwrap();
        assert_eq!(reference.id, "PMID:31234567");
    }

    #[test]
    fn doi_prefixes_stripped() {
        let publication = Publication {
            alias: "lee2020".into(),
            pmid: None,
            doi: Some("https://doi.org/10.1000/abc".into()),
            title: Some("A cohort".into()),
            year: None,
        };
        let reference = publication.external_reference().unwrap();
        assert_eq!(reference.id, "DOI:10.1000/abc");
        assert_eq!(reference.reference.as_deref(), Some("https://doi.org/10.1000/abc"));
    }
}
