//! Error types for linmd.

use thiserror::Error;

use crate::record::RecordKind;

/// Top-level result type for linmd operations.
pub type Result<T> = std::result::Result<T, LinmdError>;

/// Top-level error type for linmd.
#[derive(Debug, Error)]
pub enum LinmdError {
    #[error(
        "no record id found in {path}: add a `linear-issue-id:` or `linear-document-id:` line \
         to the metadata block, or rename the file to include a ticket id such as ABC-123"
    )]
    IdentityNotFound { path: String },

    #[error("malformed metadata block: {0}")]
    HeaderMalformed(#[from] HeaderError),

    #[error("{kind} {id} not found")]
    RecordNotFound { kind: RecordKind, id: String },

    #[error("failed to fetch {kind} {id}: {reason}")]
    RemoteFetchFailed {
        kind: RecordKind,
        id: String,
        reason: String,
    },

    #[error("failed to update {kind} {id}: {reason}")]
    RemoteUpdateFailed {
        kind: RecordKind,
        id: String,
        reason: String,
    },

    #[error("failed to {op} {path}: {source}")]
    FilesystemFailed {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LinmdError {
    /// Wrap an I/O error with the operation and path it failed on.
    pub fn fs(op: &'static str, path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::FilesystemFailed {
            op,
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Errors separating the metadata block from the body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("metadata block not found")]
    Missing,

    #[error("no closing '---' delimiter after the opening one")]
    Unclosed,

    #[error("content after the metadata block not found")]
    BodyNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_human_readable_messages() {
        let err = LinmdError::IdentityNotFound {
            path: "notes/todo.md".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("notes/todo.md"));
        assert!(msg.contains("rename the file"));

        let err = LinmdError::RecordNotFound {
            kind: RecordKind::Document,
            id: "doc-42".to_string(),
        };
        assert_eq!(err.to_string(), "document doc-42 not found");
    }

    #[test]
    fn body_not_found_is_distinct_from_missing_header() {
        let missing = LinmdError::from(HeaderError::Missing).to_string();
        let body = LinmdError::from(HeaderError::BodyNotFound).to_string();
        assert_ne!(missing, body);
        assert!(body.contains("content after the metadata block"));
    }

    #[test]
    fn filesystem_error_names_operation_and_path() {
        let err = LinmdError::fs(
            "delete",
            "/tmp/a.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("failed to delete /tmp/a.md"));
    }
}
