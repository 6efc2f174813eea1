//! # linmd-sync
//!
//! Two-way sync between a markdown file and the remote issue or document
//! it is linked to.
//!
//! - [`SyncEngine::pull`]: overwrite the file from the record, regenerate
//!   its metadata block, and rename or move it to match the naming settings
//! - [`SyncEngine::push`]: send the file's body and name to the record
//! - [`RecordStore`]: the remote service boundary
//! - [`SettingsStore`]: where settings are read from at the start of each call
//!
//! There is no conflict detection: whichever side is synced last wins.

pub mod config;
pub mod engine;
pub mod store;

pub use config::{MemorySettingsStore, SettingsStore, TomlSettingsStore};
pub use engine::{PullOutcome, PullPlan, PushOutcome, SyncEngine, SyncStatus};
pub use store::{
    DocumentUpdate, FileRecordStore, IssueUpdate, MemoryRecordStore, RecordStore, StoreError,
};
