//! Destination directory and file name for a pulled record.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use linmd_core::error::Result;
use linmd_core::settings::{DirectoryFormat, TemplateConfig};
use linmd_core::template::{expand, sanitize, sanitize_component};
use linmd_core::{Record, RecordKind};

use crate::ensure_dir;

/// Directory used when bucketing by team and the record has no team name.
pub const UNKNOWN_TEAM: &str = "Unknown Team";

/// Directory used when bucketing by status and the record has no state name.
pub const UNKNOWN_STATUS: &str = "Unknown Status";

/// The directory a record belongs in under `base_dir`, without touching disk.
///
/// Team and state names that cannot name a child directory (blank, `.` or
/// `..`) fall back to the unknown bucket, so the result always stays one
/// level below `base_dir`.
#[must_use]
pub fn bucket_dir(record: &Record, base_dir: &Path, bucketing: DirectoryFormat) -> PathBuf {
    let (name, fallback) = match bucketing {
        DirectoryFormat::None => return base_dir.to_path_buf(),
        DirectoryFormat::Team => (record.nested_name("team"), UNKNOWN_TEAM),
        DirectoryFormat::Status => (record.nested_name("state"), UNKNOWN_STATUS),
    };
    let bucket = name
        .map(|n| sanitize_component(&n))
        .filter(|n| is_child_component(n))
        .unwrap_or_else(|| fallback.to_string());
    base_dir.join(bucket)
}

fn is_child_component(name: &str) -> bool {
    !matches!(name.trim(), "" | "." | "..")
}

/// Resolve the directory a record is pulled into, creating it if needed.
///
/// # Errors
///
/// Returns [`linmd_core::LinmdError::FilesystemFailed`] if the directory
/// cannot be created.
pub fn directory_for(
    record: &Record,
    base_dir: &Path,
    bucketing: DirectoryFormat,
) -> Result<PathBuf> {
    let dir = bucket_dir(record, base_dir, bucketing);
    if !dir.as_os_str().is_empty() {
        ensure_dir(&dir)?;
    }
    Ok(dir)
}

/// Expand the configured filename template for a record and sanitize it.
#[must_use]
pub fn filename_for(
    record: &Record,
    id: &str,
    kind: RecordKind,
    config: &TemplateConfig,
    today: NaiveDate,
) -> String {
    let raw = expand(
        &config.filename_template,
        record,
        id,
        kind,
        today,
        config.date_format,
    );
    sanitize(&raw)
}
