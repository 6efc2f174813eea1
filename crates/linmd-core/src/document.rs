//! Local document: a markdown file as read at the start of a sync call.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::frontmatter::{split_header, HeaderSplit};
use crate::identity::{resolve, SyncReference};

/// A synced markdown file: its path and the raw text read from disk.
///
/// Documents are never cached; every sync call reads a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDocument {
    pub path: PathBuf,
    pub text: String,
}

impl LocalDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Resolve which record this document is bound to.
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub fn reference(&self) -> Result<SyncReference> {
        resolve(&self.text, &self.path)
    }

    /// Split the metadata block from the body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LinmdError::HeaderMalformed`] when the block is
    /// missing, unclosed, or not followed by a body.
    pub fn split(&self) -> Result<HeaderSplit<'_>> {
        Ok(split_header(&self.text)?)
    }

    /// File name without its extension, used as the remote title on push.
    #[must_use]
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory the document lives in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HeaderError, LinmdError};

    #[test]
    fn title_is_file_stem() {
        let doc = LocalDocument::new("/work/notes/ABC-1 Fix login.md", "");
        assert_eq!(doc.title(), "ABC-1 Fix login");
        assert_eq!(doc.dir(), Path::new("/work/notes"));
    }

    #[test]
    fn split_surfaces_body_not_found_but_reference_resolves() {
        let doc = LocalDocument::new("a.md", "---\nlinear-issue-id: A-1\n---");
        let err = doc.split().unwrap_err();
        assert!(matches!(
            err,
            LinmdError::HeaderMalformed(HeaderError::BodyNotFound)
        ));
        assert_eq!(doc.reference().unwrap().id, "A-1");
    }

    #[test]
    fn reference_resolves_from_text() {
        let doc = LocalDocument::new("a.md", "---\nlinear-issue-id: A-1\n---\n\nbody\n");
        assert_eq!(doc.reference().unwrap().id, "A-1");
    }
}
