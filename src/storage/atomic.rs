//! Whole-file JSON persistence
//!
//! Files are replaced by writing a sibling temporary file and renaming it over
//! the destination, so a crash mid-write leaves either the previous file or the
//! new one on disk, never a truncated mix.

use crate::storage::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serializes `value` as pretty-printed UTF-8 JSON and atomically replaces `path`
///
/// # Arguments
///
/// * `path` - Destination file
/// * `value` - Any serializable value
///
/// # Returns
///
/// * `Ok(())` - The destination now holds the new content
/// * `Err(StorageError)` - Nothing was replaced; a previous file is untouched
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let mut encoded = serde_json::to_vec_pretty(value)?;
    encoded.push(b'\n');
    write_atomic(path, &encoded)
}

/// Atomically replaces `path` with `contents`, creating parent directories
pub fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| persist_error(path, source))?;
    }

    let tmp_path = temporary_path(path);
    let write_result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()
    })();

    if let Err(source) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(persist_error(path, source));
    }

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        persist_error(path, source)
    })?;

    tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Reads a JSON document, treating a missing or unreadable file as absent
///
/// Returns `None` when the file does not exist, cannot be read, or does not
/// decode as `T`. The latter two are logged as warnings.
pub fn read_json_soft<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist yet", path.display());
            return None;
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring corrupt file {}: {}", path.display(), e);
            None
        }
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn persist_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Persist {
        path: path.to_path_buf(),
        source,
    }
}
