//! The remote record store collaborator.
//!
//! [`RecordStore`] is the boundary to the tracking service. The engine only
//! ever fetches one record and, on push, updates it. Two implementations
//! ship here: [`MemoryRecordStore`] for tests and embedding, and
//! [`FileRecordStore`], a snapshot file on disk that the CLI talks to.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use linmd_core::{Record, RecordKind};

/// Failure talking to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("invalid store data: {0}")]
    Invalid(String),
}

/// Fields written to an issue on push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueUpdate {
    pub title: String,
    pub description: String,
}

/// Fields written to a document on push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    pub title: String,
    pub content: String,
}

/// Remote service exposing issues and documents.
///
/// Fetches accept either the stable id or, for issues, the human ticket
/// identifier. Updates are addressed by the stable id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_issue(&self, id: &str) -> Result<Option<Record>, StoreError>;

    async fn fetch_document(&self, id: &str) -> Result<Option<Record>, StoreError>;

    async fn update_issue(&self, id: &str, update: IssueUpdate) -> Result<(), StoreError>;

    async fn update_document(&self, id: &str, update: DocumentUpdate) -> Result<(), StoreError>;

    /// Fetch a record of either kind.
    async fn fetch(&self, kind: RecordKind, id: &str) -> Result<Option<Record>, StoreError> {
        match kind {
            RecordKind::Issue => self.fetch_issue(id).await,
            RecordKind::Document => self.fetch_document(id).await,
        }
    }
}

fn is_match(record: &Record, kind: RecordKind, id: &str) -> bool {
    record.kind == kind && (record.id == id || record.identifier.as_deref() == Some(id))
}

/// A write received by a [`MemoryRecordStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCall {
    Issue { id: String, update: IssueUpdate },
    Document { id: String, update: DocumentUpdate },
}

/// In-process record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<String, Record>>,
    updates: Mutex<Vec<UpdateCall>>,
    fail_updates: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`, keyed by their stable id.
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let records = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    pub async fn insert(&self, record: Record) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    /// The current copy of a record by stable id.
    pub async fn get(&self, id: &str) -> Option<Record> {
        self.records.read().await.get(id).cloned()
    }

    /// Every update received so far, oldest first.
    pub async fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().await.clone()
    }

    /// Make subsequent updates fail with a transport error.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    async fn find(&self, kind: RecordKind, id: &str) -> Option<Record> {
        self.records
            .read()
            .await
            .values()
            .find(|r| is_match(r, kind, id))
            .cloned()
    }

    async fn apply(
        &self,
        kind: RecordKind,
        id: &str,
        title: &str,
        body: &str,
        call: UpdateCall,
    ) -> Result<(), StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection reset".to_string()));
        }
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .filter(|r| r.kind == kind)
            .ok_or_else(|| StoreError::Invalid(format!("no {kind} with id {id}")))?;
        record.title = title.to_string();
        record.body = body.to_string();
        self.updates.lock().await.push(call);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn fetch_issue(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.find(RecordKind::Issue, id).await)
    }

    async fn fetch_document(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.find(RecordKind::Document, id).await)
    }

    async fn update_issue(&self, id: &str, update: IssueUpdate) -> Result<(), StoreError> {
        let call = UpdateCall::Issue {
            id: id.to_string(),
            update: update.clone(),
        };
        self.apply(RecordKind::Issue, id, &update.title, &update.description, call)
            .await
    }

    async fn update_document(&self, id: &str, update: DocumentUpdate) -> Result<(), StoreError> {
        let call = UpdateCall::Document {
            id: id.to_string(),
            update: update.clone(),
        };
        self.apply(RecordKind::Document, id, &update.title, &update.content, call)
            .await
    }
}

/// Snapshot format of a [`FileRecordStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub records: Vec<Record>,
}

/// Record store backed by a JSON or YAML snapshot file.
///
/// The file is re-read on every call and rewritten on every update, so
/// edits made to it between calls are always observed.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_yaml(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        )
    }

    /// Read and parse the snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transport`] if the file cannot be read and
    /// [`StoreError::Invalid`] if it cannot be parsed.
    pub async fn load(&self) -> Result<Snapshot, StoreError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::Transport(format!("{}: {e}", self.path.display())))?;
        if self.is_yaml() {
            serde_yaml::from_str(&text).map_err(|e| StoreError::Invalid(e.to_string()))
        } else {
            serde_json::from_str(&text).map_err(|e| StoreError::Invalid(e.to_string()))
        }
    }

    /// Serialize and write the snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the snapshot cannot be serialized
    /// and [`StoreError::Transport`] if the file cannot be written.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let text = if self.is_yaml() {
            serde_yaml::to_string(snapshot).map_err(|e| StoreError::Invalid(e.to_string()))?
        } else {
            serde_json::to_string_pretty(snapshot)
                .map_err(|e| StoreError::Invalid(e.to_string()))?
        };
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| StoreError::Transport(format!("{}: {e}", self.path.display())))
    }

    async fn find(&self, kind: RecordKind, id: &str) -> Result<Option<Record>, StoreError> {
        let snapshot = self.load().await?;
        Ok(snapshot.records.into_iter().find(|r| is_match(r, kind, id)))
    }

    async fn apply(
        &self,
        kind: RecordKind,
        id: &str,
        title: String,
        body: String,
    ) -> Result<(), StoreError> {
        let mut snapshot = self.load().await?;
        let record = snapshot
            .records
            .iter_mut()
            .find(|r| r.kind == kind && r.id == id)
            .ok_or_else(|| StoreError::Invalid(format!("no {kind} with id {id}")))?;
        record.title = title;
        record.body = body;
        self.save(&snapshot).await?;
        debug!(store = %self.path.display(), %kind, id, "snapshot updated");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn fetch_issue(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.find(RecordKind::Issue, id).await
    }

    async fn fetch_document(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.find(RecordKind::Document, id).await
    }

    async fn update_issue(&self, id: &str, update: IssueUpdate) -> Result<(), StoreError> {
        self.apply(RecordKind::Issue, id, update.title, update.description)
            .await
    }

    async fn update_document(&self, id: &str, update: DocumentUpdate) -> Result<(), StoreError> {
        self.apply(RecordKind::Document, id, update.title, update.content)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc_1() -> Record {
        Record::issue("uuid-1", "Hello", "World").with_identifier("ABC-1")
    }

    #[tokio::test]
    async fn memory_store_fetches_by_id_or_identifier() {
        let store =
            MemoryRecordStore::with_records([abc_1(), Record::document("doc-1", "D", "")]);
        assert!(store.fetch_issue("uuid-1").await.unwrap().is_some());
        assert!(store.fetch_issue("ABC-1").await.unwrap().is_some());
        assert!(store.fetch_issue("doc-1").await.unwrap().is_none());
        assert!(store.fetch(RecordKind::Document, "doc-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn memory_store_records_updates() {
        let store = MemoryRecordStore::with_records([abc_1()]);
        let update = IssueUpdate {
            title: "New".to_string(),
            description: "Body".to_string(),
        };
        store.update_issue("uuid-1", update.clone()).await.unwrap();
        assert_eq!(
            store.updates().await,
            vec![UpdateCall::Issue {
                id: "uuid-1".to_string(),
                update
            }]
        );
        assert_eq!(store.get("uuid-1").await.unwrap().body, "Body");
    }

    #[tokio::test]
    async fn memory_store_can_fail_updates() {
        let store = MemoryRecordStore::with_records([abc_1()]);
        store.fail_updates(true);
        let err = store
            .update_issue(
                "uuid-1",
                IssueUpdate {
                    title: "x".to_string(),
                    description: "y".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        assert!(store.updates().await.is_empty());
        assert_eq!(store.get("uuid-1").await.unwrap().title, "Hello");
    }

    #[tokio::test]
    async fn file_store_round_trips_yaml_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path().join("records.yaml"));
        store
            .save(&Snapshot {
                records: vec![abc_1()],
            })
            .await
            .unwrap();

        let fetched = store.fetch_issue("ABC-1").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Hello");

        store
            .update_issue(
                "uuid-1",
                IssueUpdate {
                    title: "Renamed".to_string(),
                    description: "New body".to_string(),
                },
            )
            .await
            .unwrap();
        let reloaded = store.fetch_issue("uuid-1").await.unwrap().unwrap();
        assert_eq!(reloaded.title, "Renamed");
        assert_eq!(reloaded.body, "New body");
    }

    #[tokio::test]
    async fn file_store_missing_file_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path().join("missing.json"));
        let err = store.fetch_issue("ABC-1").await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[tokio::test]
    async fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileRecordStore::new(path).fetch_issue("A-1").await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }
}
