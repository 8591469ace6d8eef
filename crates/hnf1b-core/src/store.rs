//! Record stores.
//!
//! [`DirectoryStore`] writes one pretty JSON file per record id.
//! [`JsonFileWriter`] is the dry-run sink: records are collected in memory
//! and written as a single JSON array, sorted by id, on [`RecordStore::finish`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use hnf1b_model::Phenopacket;

use crate::error::StoreError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Destination for canonical records. Shared across worker threads.
pub trait RecordStore: Send + Sync {
    fn store(&self, record: &Phenopacket) -> Result<(), StoreError>;

    /// Flush anything buffered. Called once after the last record.
    fn finish(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store a record, retrying up to `retries` more times on failure.
pub fn store_with_retry(
    store: &dyn RecordStore,
    record: &Phenopacket,
    retries: u32,
) -> Result<(), StoreError> {
    let mut attempt = 0;
    loop {
        match store.store(record) {
            Ok(()) => return Ok(()),
            Err(error) if attempt < retries => {
                attempt += 1;
                warn!(attempt, %error, "Store failed; retrying");
            }
            Err(error) => return Err(error),
        }
    }
}

/// Write `bytes` to `path` through a temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io("create directory", parent, e))?;
    }
    let temp_path = path.with_extension(format!(
        "json.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let mut file =
        fs::File::create(&temp_path).map_err(|e| StoreError::io("create", &temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| StoreError::io("write", &temp_path, e))?;
    drop(file);
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StoreError::io("rename", path, e)
    })
}

/// One `<id>.json` file per record.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(StoreError::InvalidId { id: id.to_string() });
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl RecordStore for DirectoryStore {
    fn store(&self, record: &Phenopacket) -> Result<(), StoreError> {
        let path = self.path_for(&record.id)?;
        let mut bytes = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Encode {
            id: record.id.clone(),
            source,
        })?;
        bytes.push(b'\n');
        write_atomic(&path, &bytes)?;
        debug!(path = %path.display(), "Record written");
        Ok(())
    }
}

/// Dry-run sink: every record into one JSON array file.
#[derive(Debug)]
pub struct JsonFileWriter {
    path: PathBuf,
    records: Mutex<Vec<Phenopacket>>,
}

impl JsonFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonFileWriter {
    fn store(&self, record: &Phenopacket) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.push(record.clone());
        Ok(())
    }

    fn finish(&self) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.sort_by(|a, b| a.id.cmp(&b.id));
        let mut bytes =
            serde_json::to_vec_pretty(&*records).map_err(|source| StoreError::Encode {
                id: "<all>".to_string(),
                source,
            })?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)?;
        info!(path = %self.path.display(), records = records.len(), "Dry-run output written");
        Ok(())
    }
}
