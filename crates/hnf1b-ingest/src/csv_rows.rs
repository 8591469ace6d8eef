//! Streaming CSV → [`SourceRow`] reader.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use hnf1b_model::SourceRow;
use hnf1b_standards::FeatureRegistry;

use crate::columns::{ColumnMapping, ColumnTarget, CoreField};
use crate::error::{IngestError, Result};

/// Anything that yields typed source rows.
pub trait RowSource: Iterator<Item = Result<SourceRow>> {}

impl<T> RowSource for T where T: Iterator<Item = Result<SourceRow>> {}

/// Reads a curated spreadsheet export one record at a time.
///
/// Blank lines and rows with every cell empty are skipped. Rows keep their
/// 1-based data row number for diagnostics. A record that cannot be decoded
/// yields [`IngestError::InvalidRow`] and iteration can continue past it.
pub struct CsvRowSource<R: Read> {
    reader: csv::Reader<R>,
    mapping: ColumnMapping,
    path: PathBuf,
    row_number: usize,
}

impl CsvRowSource<File> {
    pub fn open(path: &Path, registry: &FeatureRegistry) -> Result<Self> {
        if !path.exists() {
            return Err(IngestError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path, registry)
    }
}

impl<R: Read> CsvRowSource<R> {
    /// Wrap any reader; `path` is only used in messages.
    pub fn from_reader(reader: R, path: impl Into<PathBuf>, registry: &FeatureRegistry) -> Result<Self> {
        let path = path.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| IngestError::Csv {
                path: path.clone(),
                source,
            })?
            .iter()
            .map(String::from)
            .collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(IngestError::EmptyFile { path });
        }

        let mapping = ColumnMapping::from_headers(&headers, registry);
        if !mapping.has(CoreField::IndividualKey) {
            return Err(IngestError::MissingColumn {
                column: CoreField::IndividualKey.name().to_string(),
                path,
            });
        }

        info!(
            path = %path.display(),
            columns = headers.len(),
            clinical = mapping.clinical_keys().len(),
            unmapped = mapping.unmapped().len(),
            "Opened source sheet"
        );
        if !mapping.unmapped().is_empty() {
            debug!(headers = ?mapping.unmapped(), "Unrecognized columns ignored");
        }

        Ok(Self {
            reader,
            mapping,
            path,
            row_number: 0,
        })
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    fn map_record(&self, record: &csv::StringRecord) -> SourceRow {
        let mut row = SourceRow {
            row_number: self.row_number,
            ..SourceRow::default()
        };
        for (index, cell) in record.iter().enumerate() {
            let value = cell.trim();
            if value.is_empty() {
                continue;
            }
            let Some(target) = self.mapping.target(index) else {
                continue;
            };
            let owned = Some(value.to_string());
            match target {
                ColumnTarget::Clinical(key) => {
                    row.clinical.insert(key.clone(), value.to_string());
                }
                ColumnTarget::Core(field) => match field {
                    CoreField::IndividualKey => row.individual_key = value.to_string(),
                    CoreField::Sex => row.sex = owned,
                    CoreField::AgeOnset => row.age_onset = owned,
                    CoreField::AgeReported => row.age_reported = owned,
                    CoreField::ReviewDate => row.review_date = owned,
                    CoreField::Publication => row.publication = owned,
                    CoreField::Hgvs => row.variant.hgvs = owned,
                    CoreField::Genomic => row.variant.genomic = owned,
                    CoreField::VcfInfo => row.variant.vcf_info = owned,
                    CoreField::FreeTextVariant => row.variant.free_text = owned,
                    CoreField::Transcript => row.transcript = owned,
                    CoreField::Classification => row.classification = owned,
                    CoreField::Zygosity => row.zygosity = owned,
                    CoreField::Inheritance => row.inheritance = owned,
                },
            }
        }
        row
    }
}

impl<R: Read> Iterator for CsvRowSource<R> {
    type Item = Result<SourceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = csv::StringRecord::new();
        loop {
            match self.reader.read_record(&mut record) {
                Ok(false) => return None,
                Ok(true) => {
                    self.row_number += 1;
                    if record.iter().all(|cell| cell.trim().is_empty()) {
                        continue;
                    }
                    return Some(Ok(self.map_record(&record)));
                }
                Err(source) if source.is_io_error() => {
                    return Some(Err(IngestError::Csv {
                        path: self.path.clone(),
                        source,
                    }));
                }
                // The record is consumed; later rows stay readable.
                Err(source) => {
                    self.row_number += 1;
                    return Some(Err(IngestError::InvalidRow {
                        path: self.path.clone(),
                        row: self.row_number,
                        message: source.to_string(),
                    }));
                }
            }
        }
    }
}
