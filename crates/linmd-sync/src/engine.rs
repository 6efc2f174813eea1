//! Pull and push between a markdown file and its remote record.
//!
//! Both directions are one-shot: they read the file, the settings and the
//! record fresh, do their work, and keep nothing afterwards.
//!
//! A pull writes the destination file before it deletes the source. If the
//! call is abandoned in between, both files remain on disk. Nothing is
//! rolled back when a later step fails.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use linmd_core::error::{LinmdError, Result};
use linmd_core::frontmatter::{ensure_trailing_newline, has_header, wrap};
use linmd_core::identity::{identity_line, offers_sync_actions};
use linmd_core::merge::build_header;
use linmd_core::{
    DirectoryFormat, LocalDocument, Record, RecordKind, ResolvedFrom, SyncReference,
    TemplateConfig,
};
use linmd_vault::{
    bucket_dir, directory_for, filename_for, is_same_file, read_document, remove_document,
    write_document,
};

use crate::config::SettingsStore;
use crate::store::{DocumentUpdate, IssueUpdate, RecordStore, StoreError};

/// What a pull would write, computed without touching disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PullPlan {
    pub reference: SyncReference,
    pub record: Record,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Directory buckets are created under.
    pub base_dir: PathBuf,
    pub bucketing: DirectoryFormat,
    /// Full text of the destination file.
    pub content: String,
}

impl PullPlan {
    /// Whether the pull moves the file to a new path.
    #[must_use]
    pub fn renames(&self) -> bool {
        self.source != self.destination
    }
}

/// Result of a completed pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub reference: SyncReference,
    pub destination: PathBuf,
    /// The source file, if it was deleted after the rename.
    pub removed: Option<PathBuf>,
}

/// Result of a completed push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub reference: SyncReference,
    /// Stable id of the updated record.
    pub record_id: String,
    pub title: String,
    /// Whether an identity block was written into the file first.
    pub header_added: bool,
}

/// What `status` reports for a file.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub reference: SyncReference,
    pub offers_sync_actions: bool,
    pub plan: PullPlan,
}

/// Sync orchestrator over a record store and a settings store.
pub struct SyncEngine<S, C> {
    store: S,
    settings: C,
    root: Option<PathBuf>,
    today: Option<NaiveDate>,
}

impl<S: RecordStore, C: SettingsStore> SyncEngine<S, C> {
    pub fn new(store: S, settings: C) -> Self {
        Self {
            store,
            settings,
            root: None,
            today: None,
        }
    }

    /// Base directory for team/status buckets.
    ///
    /// Without a root, buckets are created next to the file being pulled.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Pin the date used for `${date}` instead of reading the local clock.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &C {
        &self.settings
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn fetch(&self, kind: RecordKind, id: &str) -> Result<Record> {
        let record = self
            .store
            .fetch(kind, id)
            .await
            .map_err(|e| LinmdError::RemoteFetchFailed {
                kind,
                id: id.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| LinmdError::RecordNotFound {
                kind,
                id: id.to_string(),
            })?;
        debug!(%kind, id, record_id = %record.id, title = %record.title, "fetched record");
        Ok(record)
    }

    /// Work out what pulling `path` would write, without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::IdentityNotFound`], [`LinmdError::HeaderMalformed`],
    /// [`LinmdError::RecordNotFound`], [`LinmdError::RemoteFetchFailed`], or a
    /// filesystem or config error.
    pub async fn plan_pull(&self, path: &Path) -> Result<PullPlan> {
        let config = self.settings.load()?.template_config();
        let doc = read_document(path)?;
        self.plan(doc, &config).await
    }

    async fn plan(&self, doc: LocalDocument, config: &TemplateConfig) -> Result<PullPlan> {
        let reference = doc.reference()?;
        let record = self.fetch(reference.kind, &reference.id).await?;

        let header = build_header(
            &record,
            &reference.id,
            reference.kind,
            reference.header.as_deref(),
            config,
        );
        let content = if header.is_empty() {
            record.body.clone()
        } else {
            wrap(&header, &record.body)
        };
        let content = ensure_trailing_newline(content);

        let base_dir = match (&self.root, config.bucketing) {
            (Some(root), DirectoryFormat::Team | DirectoryFormat::Status) => root.clone(),
            _ => doc.dir().to_path_buf(),
        };
        let dir = bucket_dir(&record, &base_dir, config.bucketing);
        let name = filename_for(&record, &reference.id, reference.kind, config, self.today());

        Ok(PullPlan {
            destination: dir.join(name),
            base_dir,
            bucketing: config.bucketing,
            source: doc.path,
            reference,
            record,
            content,
        })
    }

    /// Overwrite the local file with the remote record.
    ///
    /// The file is renamed (and moved into its bucket) to match the current
    /// naming settings. The source file is only deleted after the new one
    /// has been written.
    ///
    /// # Errors
    ///
    /// See [`Self::plan_pull`]; also [`LinmdError::FilesystemFailed`] if the
    /// destination cannot be written or the source cannot be removed.
    pub async fn pull(&self, path: &Path) -> Result<PullOutcome> {
        let plan = self.plan_pull(path).await?;

        directory_for(&plan.record, &plan.base_dir, plan.bucketing)?;
        let moves = plan.renames() && !is_same_file(&plan.source, &plan.destination);
        if moves && plan.destination.exists() {
            warn!(destination = %plan.destination.display(), "overwriting existing file");
        }
        write_document(&plan.destination, &plan.content)?;
        info!(
            kind = %plan.reference.kind,
            id = %plan.reference.id,
            destination = %plan.destination.display(),
            "pulled record into file"
        );

        let mut removed = None;
        if moves {
            remove_document(&plan.source)?;
            info!(source = %plan.source.display(), "deleted old file");
            removed = Some(plan.source);
        }

        Ok(PullOutcome {
            reference: plan.reference,
            destination: plan.destination,
            removed,
        })
    }

    /// Send the local file's body and name to the remote record.
    ///
    /// A file resolved only through its name gets an identity block written
    /// into it before the remote update, so later calls resolve through the
    /// block.
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::IdentityNotFound`], [`LinmdError::HeaderMalformed`],
    /// [`LinmdError::RecordNotFound`], [`LinmdError::RemoteFetchFailed`],
    /// [`LinmdError::RemoteUpdateFailed`], or a filesystem error.
    pub async fn push(&self, path: &Path) -> Result<PushOutcome> {
        let doc = read_document(path)?;
        let reference = doc.reference()?;

        let body = match reference.source {
            ResolvedFrom::Header => doc.split()?.trimmed_body().to_string(),
            ResolvedFrom::Filename => doc.text.trim().to_string(),
        };
        let title = doc.title();

        let record = self.fetch(reference.kind, &reference.id).await?;

        let header_added = reference.source == ResolvedFrom::Filename;
        if header_added {
            if has_header(&doc.text) {
                warn!(
                    path = %path.display(),
                    "metadata block has no identity line; it is sent as part of the body \
                     and nested under the new identity block"
                );
            }
            let linked = ensure_trailing_newline(wrap(
                &identity_line(reference.kind, &reference.id),
                &doc.text,
            ));
            write_document(path, &linked)?;
            info!(path = %path.display(), id = %reference.id, "added identity block");
        }

        let result = match reference.kind {
            RecordKind::Issue => {
                self.store
                    .update_issue(
                        &record.id,
                        IssueUpdate {
                            title: title.clone(),
                            description: body,
                        },
                    )
                    .await
            }
            RecordKind::Document => {
                self.store
                    .update_document(
                        &record.id,
                        DocumentUpdate {
                            title: title.clone(),
                            content: body,
                        },
                    )
                    .await
            }
        };
        result.map_err(|e: StoreError| LinmdError::RemoteUpdateFailed {
            kind: reference.kind,
            id: reference.id.clone(),
            reason: e.to_string(),
        })?;
        info!(kind = %reference.kind, id = %reference.id, %title, "pushed file to record");

        Ok(PushOutcome {
            reference,
            record_id: record.id,
            title,
            header_added,
        })
    }

    /// Describe how a file is linked and what a pull would do, read-only.
    ///
    /// # Errors
    ///
    /// See [`Self::plan_pull`].
    pub async fn status(&self, path: &Path) -> Result<SyncStatus> {
        let settings = self.settings.load()?;
        let doc = read_document(path)?;
        let offers = offers_sync_actions(&doc.text, settings.enable_code_lens);
        let plan = self.plan(doc, &settings.template_config()).await?;
        Ok(SyncStatus {
            reference: plan.reference.clone(),
            offers_sync_actions: offers,
            plan,
        })
    }
}
