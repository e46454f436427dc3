//! Tag Store - Persistent per-repository tag tracking records
//!
//! One JSON document per tracked repository lives in the configured
//! `repos_dir`:
//!
//! ```json
//! { "owner": "acme", "repo": "widget", "tags": ["v1.0", "v1.1"] }
//! ```
//!
//! `tags` holds the full upstream tag set as of the last successful
//! notification, in discovery order. Commits replace the entire list with
//! the freshly fetched set and are written atomically (temp file plus
//! rename), so an interrupted write never leaves a partial record behind.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading or writing tracking records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read tracking record {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tracking record {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("tracking record {path:?} is invalid: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("failed to write tracking record {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tracking record for a single repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoRecord {
    pub owner: String,
    pub repo: String,

    /// Full upstream tag set as of the last committed notification
    #[serde(default)]
    pub tags: Vec<String>,

    /// Fields owned by other tooling; carried through rewrites untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RepoRecord {
    /// `owner/repo` display form
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Store of per-repository tracking records under a single directory
pub struct TagStore {
    dir: PathBuf,
}

impl TagStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// List tracking record files, sorted for a deterministic run order
    pub fn tracked_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Read {
            path: self.dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Read {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Load one tracking record
    pub fn load(&self, path: &Path) -> Result<RepoRecord, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let record: RepoRecord =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if record.owner.is_empty() || record.repo.is_empty() {
            return Err(StoreError::Invalid {
                path: path.to_path_buf(),
                reason: "owner and repo must be non-empty".to_string(),
            });
        }

        Ok(record)
    }

    /// Tags present upstream but not yet known locally, in `fetched` order
    pub fn new_tags(record: &RepoRecord, fetched: &[String]) -> Vec<String> {
        fetched
            .iter()
            .filter(|tag| !record.tags.contains(tag))
            .cloned()
            .collect()
    }

    /// Persist the full fetched tag set for a repository
    ///
    /// Replaces the record's tag list with the *entire* upstream set, not
    /// just the delta, keeping local state fully synchronized. The write
    /// goes through a sibling temp file and a rename so the previous record
    /// survives any I/O failure intact.
    pub fn commit(
        &self,
        path: &Path,
        record: &RepoRecord,
        fetched: Vec<String>,
    ) -> Result<(), StoreError> {
        let updated = RepoRecord {
            owner: record.owner.clone(),
            repo: record.repo.clone(),
            tags: fetched,
            extra: record.extra.clone(),
        };

        let content =
            serde_json::to_string_pretty(&updated).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, content).map_err(|source| StoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;

        fs::rename(&tmp_path, path).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            "Committed {} tags for {}",
            updated.tags.len(),
            updated.full_name()
        );
        Ok(())
    }
}
