//! On-disk label cache (resolver tier 2).
//!
//! One JSON file per code, `<dir>/<CODE with ':' replaced by '_'>.json`.
//! Writes go to a temp file in the same directory and are renamed into
//! place, so concurrent readers never see a partial entry.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{OntologyError, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Serialized cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub code: String,
    pub label: String,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    ttl: TimeDelta,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_days: u32) -> Self {
        Self {
            dir: dir.into(),
            ttl: TimeDelta::days(i64::from(ttl_days)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, code: &str) -> PathBuf {
        let file_name: String = code
            .chars()
            .map(|c| match c {
                ':' => '_',
                c if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' => c,
                _ => '_',
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }

    /// Fresh entry for `code`, if any.
    ///
    /// Missing, unreadable, malformed and expired files are all misses.
    pub fn get(&self, code: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let path = self.path_for(code);
        let text = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&text) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(path = %path.display(), %error, "Ignoring malformed cache entry");
                return None;
            }
        };
        if entry.code != code || entry.label.trim().is_empty() {
            return None;
        }
        if now - entry.resolved_at > self.ttl {
            debug!(code, resolved_at = %entry.resolved_at, "Disk cache entry expired");
            return None;
        }
        Some(entry)
    }

    /// Persist `entry`, replacing any previous file atomically.
    pub fn put(&self, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| OntologyError::Io {
            operation: "create directory",
            path: self.dir.clone(),
            source,
        })?;

        let bytes = serde_json::to_vec_pretty(entry).map_err(|source| OntologyError::Encode {
            code: entry.code.clone(),
            source,
        })?;

        let path = self.path_for(&entry.code);
        let temp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let mut file = fs::File::create(&temp_path).map_err(|source| OntologyError::Io {
            operation: "create",
            path: temp_path.clone(),
            source,
        })?;
        file.write_all(&bytes).map_err(|source| OntologyError::Io {
            operation: "write",
            path: temp_path.clone(),
            source,
        })?;
        drop(file);

        fs::rename(&temp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            OntologyError::Io {
                operation: "rename",
                path: path.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_replace_colon() {
        let cache = DiskCache::new("/tmp/cache", 30);
        assert_eq!(
            cache.path_for("HP:0000107"),
            PathBuf::from("/tmp/cache/HP_0000107.json")
        );
    }

    #[test]
    fn expired_entries_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path(), 30);
        let now = Utc::now();
        cache
            .put(&CacheEntry {
                code: "HP:0000107".into(),
                label: "Renal cyst".into(),
                resolved_at: now - TimeDelta::days(31),
            })
            .unwrap();
        assert!(cache.get("HP:0000107", now).is_none());
        assert!(cache.get("HP:0000107", now - TimeDelta::days(2)).is_some());
    }
}
