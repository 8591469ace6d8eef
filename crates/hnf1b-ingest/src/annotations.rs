//! Auxiliary variant effect annotations (tab-separated).
//!
//! Columns: `variant`, `gene`, `transcript`, `hgvs_c`, `hgvs_p`,
//! `consequence`, `impact`. Entries are keyed by a caller-supplied function
//! (normally the coordinate key) so any notation of a variant finds them.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use hnf1b_model::VariantAnnotation;

use crate::error::{IngestError, Result};

#[derive(Debug, Deserialize)]
struct AnnotationRecord {
    variant: String,
    #[serde(default)]
    gene: Option<String>,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    hgvs_c: Option<String>,
    #[serde(default)]
    hgvs_p: Option<String>,
    #[serde(default)]
    consequence: Option<String>,
    #[serde(default)]
    impact: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "." && v != "-")
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    by_key: BTreeMap<String, VariantAnnotation>,
}

impl AnnotationIndex {
    pub fn load<K>(path: &Path, key_of: K) -> Result<Self>
    where
        K: Fn(&str) -> Option<String>,
    {
        let file = File::open(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path, key_of)
    }

    /// Parse annotations; rows whose variant cannot be keyed are skipped.
    /// The first annotation for a key wins.
    pub fn from_reader<R, K>(reader: R, path: impl Into<PathBuf>, key_of: K) -> Result<Self>
    where
        R: Read,
        K: Fn(&str) -> Option<String>,
    {
        let path = path.into();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut by_key = BTreeMap::new();
        let mut skipped = 0usize;
        for (idx, record) in reader.deserialize::<AnnotationRecord>().enumerate() {
            let record = record.map_err(|source| IngestError::Csv {
                path: path.clone(),
                source,
            })?;
            let Some(key) = key_of(record.variant.trim()) else {
                warn!(row = idx + 1, variant = %record.variant, "Annotation variant not recognized");
                skipped += 1;
                continue;
            };
            by_key.entry(key).or_insert_with(|| VariantAnnotation {
                gene: clean(record.gene),
                transcript: clean(record.transcript),
                hgvs_c: clean(record.hgvs_c),
                hgvs_p: clean(record.hgvs_p),
                consequence: clean(record.consequence),
                impact: clean(record.impact),
            });
        }

        info!(
            path = %path.display(),
            annotations = by_key.len(),
            skipped,
            "Loaded variant annotations"
        );
        Ok(Self { by_key })
    }

    pub fn get(&self, key: &str) -> Option<&VariantAnnotation> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
