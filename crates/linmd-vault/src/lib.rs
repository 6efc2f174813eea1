//! # linmd-vault
//!
//! File system operations for synced markdown files.
//!
//! Every failure is reported as [`LinmdError::FilesystemFailed`] naming the
//! operation and the path. Nothing here is transactional: a caller that
//! writes one file and deletes another can be interrupted in between.

pub mod paths;

use std::fs;
use std::path::Path;

use tracing::debug;

use linmd_core::error::{LinmdError, Result};
use linmd_core::LocalDocument;

pub use paths::{bucket_dir, directory_for, filename_for, UNKNOWN_STATUS, UNKNOWN_TEAM};

/// Read a markdown file from disk.
///
/// # Errors
///
/// Returns [`LinmdError::FilesystemFailed`] if the file cannot be read.
pub fn read_document(path: &Path) -> Result<LocalDocument> {
    let text = fs::read_to_string(path).map_err(|e| LinmdError::fs("read", path, e))?;
    Ok(LocalDocument::new(path, text))
}

/// Write text to a file, replacing any previous content.
///
/// # Errors
///
/// Returns [`LinmdError::FilesystemFailed`] if the file cannot be written.
pub fn write_document(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| LinmdError::fs("write", path, e))?;
    debug!(path = %path.display(), bytes = text.len(), "wrote document");
    Ok(())
}

/// Delete a file.
///
/// # Errors
///
/// Returns [`LinmdError::FilesystemFailed`] if the file cannot be removed.
pub fn remove_document(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| LinmdError::fs("delete", path, e))?;
    debug!(path = %path.display(), "removed document");
    Ok(())
}

/// Create a directory and its parents. Succeeds if it already exists.
///
/// # Errors
///
/// Returns [`LinmdError::FilesystemFailed`] if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| LinmdError::fs("create directory", path, e))
}

/// Whether two existing paths name the same file.
///
/// Case-insensitive file systems accept two spellings of one name, so a
/// plain path comparison is not enough.
#[must_use]
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    let (Ok(ma), Ok(mb)) = (fs::metadata(a), fs::metadata(b)) else {
        return false;
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        ma.dev() == mb.dev() && ma.ino() == mb.ino()
    }
    #[cfg(not(unix))]
    {
        let _ = (ma, mb);
        matches!(
            (fs::canonicalize(a), fs::canonicalize(b)),
            (Ok(ca), Ok(cb)) if ca.to_string_lossy().to_lowercase() == cb.to_string_lossy().to_lowercase()
        )
    }
}
