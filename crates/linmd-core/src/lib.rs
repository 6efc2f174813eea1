//! # linmd-core
//!
//! Core types and pure logic for keeping markdown files and remote issues
//! or documents in step.
//!
//! This crate does no I/O. It defines:
//! - [`Record`]: a fetched issue or document, with dotted-path [`Attributes`]
//! - [`LocalDocument`]: a markdown file's path and text
//! - Metadata block codec ([`frontmatter`])
//! - Record identity resolution ([`identity`])
//! - Filename templates and sanitizing ([`template`])
//! - Metadata block regeneration ([`merge`])
//! - Settings and the per-call [`TemplateConfig`] ([`settings`])
//! - Error hierarchy ([`LinmdError`], [`HeaderError`])

pub mod document;
pub mod error;
pub mod frontmatter;
pub mod identity;
pub mod merge;
pub mod record;
pub mod settings;
pub mod template;

pub use document::LocalDocument;
pub use error::{HeaderError, LinmdError, Result};
pub use identity::{ResolvedFrom, SyncReference};
pub use record::{Attributes, Record, RecordKind, Value};
pub use settings::{DirectoryFormat, SyncSettings, TemplateConfig};
pub use template::DateFormat;
