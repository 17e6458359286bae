//! Persistent snapshot of the last successfully aggregated CIDR list.
//!
//! A single plain-text file, one CIDR per line, in last-aggregated order.
//! "up" reads it for comparison and fallback; "down" reads it as the sole
//! source of what to tear down. Overwrites go through a temp file plus
//! rename so readers never observe a partially written store.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access backup file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct BackupStore {
    path: PathBuf,
}

impl BackupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the store empty on first run, without touching existing content
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::File::create(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("Created empty backup file {}", self.path.display());
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<String>, StoreError> {
        debug!("Reading CIDRs from backup {}", self.path.display());
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Overwrite the store, one CIDR per line, order as given
    pub fn write(&self, cidrs: &[String]) -> Result<(), StoreError> {
        debug!("Overwriting backup file {}", self.path.display());

        let mut content = String::new();
        for cidr in cidrs {
            content.push_str(cidr);
            content.push('\n');
        }

        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        fs::write(&tmp, &content).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Order-insensitive comparison of two CIDR lists.
///
/// Compares sorted copies, so permutations are equal but differing
/// duplicate counts are not.
pub fn differs(current: &[String], fresh: &[String]) -> bool {
    let mut current = current.to_vec();
    let mut fresh = fresh.to_vec();
    current.sort();
    fresh.sort();
    current != fresh
}
