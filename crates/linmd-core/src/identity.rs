//! Resolve which remote record a local file belongs to.
//!
//! The identity line in the metadata block wins. Files without one fall back
//! to a ticket id embedded in the file name (`ABC-123 Fix login.md`), which
//! can only ever name an issue.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{HeaderError, LinmdError, Result};
use crate::frontmatter::{header_lines, header_text};
use crate::record::RecordKind;

/// Prefix of the identity keys, as in `linear-issue-id`.
pub const IDENTITY_PREFIX: &str = "linear";

fn identity_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"linear-(issue|document)-id:\s*([\w-]+)").expect("valid regex")
    })
}

fn ticket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]+-\d+").expect("valid regex"))
}

/// Where a [`SyncReference`] was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    /// An identity line in the document text.
    Header,
    /// A ticket id in the file name.
    Filename,
}

impl ResolvedFrom {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Filename => "filename",
        }
    }
}

/// The record a document is bound to. Recomputed on every sync call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReference {
    pub kind: RecordKind,
    pub id: String,
    pub source: ResolvedFrom,
    /// Raw inner text of the existing metadata block, if the document has one.
    pub header: Option<String>,
}

/// Metadata key binding a document to a record of `kind`.
#[must_use]
pub fn identity_key(kind: RecordKind) -> String {
    format!("{IDENTITY_PREFIX}-{kind}-id")
}

/// The mandatory metadata line for a record.
#[must_use]
pub fn identity_line(kind: RecordKind, id: &str) -> String {
    format!("{}: {id}", identity_key(kind))
}

/// Resolve the record reference for a document's text and path.
///
/// # Errors
///
/// Returns [`LinmdError::IdentityNotFound`] if neither the text nor the file
/// name yields an id, and [`LinmdError::HeaderMalformed`] if the text carries
/// an identity line but its metadata block is unclosed. A block closed at
/// the very end of the file still resolves; only reading its body fails.
pub fn resolve(text: &str, path: &Path) -> Result<SyncReference> {
    if let Some(caps) = identity_line_re().captures(text) {
        let kind = match &caps[1] {
            "issue" => RecordKind::Issue,
            _ => RecordKind::Document,
        };
        let header = match header_text(text) {
            Ok(header) => Some(header.to_string()),
            Err(HeaderError::Missing) => None,
            Err(e) => return Err(e.into()),
        };
        return Ok(SyncReference {
            kind,
            id: caps[2].to_string(),
            source: ResolvedFrom::Header,
            header,
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if let Some(m) = ticket_re().find(&file_name) {
        return Ok(SyncReference {
            kind: RecordKind::Issue,
            id: m.as_str().to_string(),
            source: ResolvedFrom::Filename,
            header: None,
        });
    }

    Err(LinmdError::IdentityNotFound {
        path: path.display().to_string(),
    })
}

/// Whether inline sync actions should be offered for a document.
///
/// True when the setting is on and the document's leading metadata block
/// carries an issue or document identity key.
#[must_use]
pub fn offers_sync_actions(text: &str, enabled: bool) -> bool {
    if !enabled {
        return false;
    }
    let Ok(header) = header_text(text) else {
        return false;
    };
    let keys = [
        identity_key(RecordKind::Issue),
        identity_key(RecordKind::Document),
    ];
    header_lines(header).any(|(key, _)| keys.iter().any(|k| k == key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolve_str(text: &str, name: &str) -> Result<SyncReference> {
        resolve(text, Path::new(name))
    }

    #[test]
    fn header_identity_line_wins_over_filename() {
        let text = "---\nlinear-document-id: 3f2a-bc\n---\n\nbody\n";
        let r = resolve_str(text, "notes/XYZ-9 plan.md").unwrap();
        assert_eq!(r.kind, RecordKind::Document);
        assert_eq!(r.id, "3f2a-bc");
        assert_eq!(r.source, ResolvedFrom::Header);
        assert_eq!(r.header.as_deref(), Some("linear-document-id: 3f2a-bc"));
    }

    #[test]
    fn first_identity_line_wins() {
        let text = "---\nlinear-issue-id: ABC-1\nlinear-issue-id: ABC-2\n---\n\n";
        assert_eq!(resolve_str(text, "x.md").unwrap().id, "ABC-1");
    }

    #[test]
    fn filename_fallback_is_always_an_issue() {
        let r = resolve_str("just text", "/tmp/ENG-42 Fix login ENG-7.md").unwrap();
        assert_eq!(r.kind, RecordKind::Issue);
        assert_eq!(r.id, "ENG-42");
        assert_eq!(r.source, ResolvedFrom::Filename);
        assert_eq!(r.header, None);
    }

    #[test]
    fn filename_ignores_directory_names() {
        let err = resolve_str("text", "/work/ABC-1/notes.md").unwrap_err();
        assert!(matches!(err, LinmdError::IdentityNotFound { .. }));
    }

    #[test]
    fn lowercase_ticket_in_filename_is_not_an_id() {
        let err = resolve_str("text", "abc-1.md").unwrap_err();
        assert!(matches!(err, LinmdError::IdentityNotFound { .. }));
    }

    #[test]
    fn identity_line_without_block_resolves_with_no_header() {
        let r = resolve_str("linear-issue-id: ABC-3\nbody", "a.md").unwrap();
        assert_eq!(r.id, "ABC-3");
        assert_eq!(r.header, None);
    }

    #[test]
    fn unclosed_block_is_malformed_not_missing() {
        let err = resolve_str("---\nlinear-issue-id: ABC-3\nbody", "a.md").unwrap_err();
        assert!(matches!(
            err,
            LinmdError::HeaderMalformed(HeaderError::Unclosed)
        ));
    }

    #[test]
    fn block_closed_at_end_of_file_still_resolves() {
        let r = resolve_str("---\nlinear-issue-id: ABC-3\nowner: sam\n---", "a.md").unwrap();
        assert_eq!(r.id, "ABC-3");
        assert_eq!(r.source, ResolvedFrom::Header);
        assert_eq!(r.header.as_deref(), Some("linear-issue-id: ABC-3\nowner: sam"));
    }

    #[test]
    fn identity_line_formats_key_and_id() {
        assert_eq!(
            identity_line(RecordKind::Issue, "ABC-1"),
            "linear-issue-id: ABC-1"
        );
    }

    #[test]
    fn sync_actions_need_setting_and_identity_key() {
        let linked = "---\nlinear-issue-id: ABC-1\n---\n\nbody\n";
        assert!(offers_sync_actions(linked, true));
        assert!(!offers_sync_actions(linked, false));
        assert!(!offers_sync_actions("---\ntitle: x\n---\n\n", true));
        assert!(!offers_sync_actions("no block at all", true));
        assert!(offers_sync_actions("---\nlinear-issue-id: ABC-1\n---", true));
    }

    proptest! {
        #[test]
        fn header_pair_resolves_regardless_of_filename(
            id in "[A-Za-z0-9_][A-Za-z0-9_-]{0,15}",
            is_issue in any::<bool>(),
            name in "[A-Za-z0-9 -]{1,20}\\.md",
        ) {
            let kind = if is_issue { RecordKind::Issue } else { RecordKind::Document };
            let text = format!("---\n{}\n---\n\nbody\n", identity_line(kind, &id));
            let r = resolve_str(&text, &name).unwrap();
            prop_assert_eq!(r.kind, kind);
            prop_assert_eq!(r.id, id);
        }

        #[test]
        fn headerless_resolves_first_ticket_in_name(
            prefix in "[a-z ]{0,6}",
            letters in "[A-Z]{1,4}",
            digits in "[0-9]{1,4}",
        ) {
            let name = format!("{prefix}{letters}-{digits} notes.md");
            let r = resolve_str("plain body", &name).unwrap();
            prop_assert_eq!(r.id, format!("{letters}-{digits}"));
        }
    }
}
