//! Settings storage.
//!
//! Workspace config: `<workspace>/.linmd/config.toml`
//!
//! The engine calls [`SettingsStore::load`] once at the start of every pull
//! and push and never holds on to the result across calls.

use std::path::{Path, PathBuf};

use tokio::sync::watch;

use linmd_core::error::{LinmdError, Result};
use linmd_core::SyncSettings;

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".linmd";

/// Path to the workspace config file: `<root>/.linmd/config.toml`.
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(STATE_DIR).join("config.toml")
}

/// Walk up from `start` to the nearest directory holding a `.linmd` directory.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(STATE_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Source of the current sync settings.
pub trait SettingsStore: Send + Sync {
    /// Read the settings as they are right now.
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::Config`] if stored settings cannot be read.
    fn load(&self) -> Result<SyncSettings>;
}

/// Fixed settings.
impl SettingsStore for SyncSettings {
    fn load(&self) -> Result<SyncSettings> {
        Ok(self.clone())
    }
}

/// Settings persisted as TOML.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<root>/.linmd/config.toml`.
    pub fn for_workspace(workspace_root: &Path) -> Self {
        Self::new(workspace_config_path(workspace_root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save to the store path (creates parent directories).
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::FilesystemFailed`] if the file cannot be written
    /// and [`LinmdError::Serialization`] if the settings cannot be encoded.
    pub fn save(&self, settings: &SyncSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LinmdError::fs("create directory", parent, e))?;
        }
        let contents = toml::to_string_pretty(settings)
            .map_err(|e| LinmdError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|e| LinmdError::fs("write", &self.path, e))
    }

    /// Load, change one key, and save.
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::Config`] for an unknown key or invalid value,
    /// plus anything [`Self::load`] or [`Self::save`] can return.
    pub fn set(&self, key: &str, value: &str) -> Result<SyncSettings> {
        let mut settings = self.load()?;
        settings.set_key(key, value)?;
        self.save(&settings)?;
        Ok(settings)
    }
}

impl SettingsStore for TomlSettingsStore {
    /// Returns defaults if the file doesn't exist.
    fn load(&self) -> Result<SyncSettings> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SyncSettings::default())
            }
            Err(e) => return Err(LinmdError::fs("read", &self.path, e)),
        };
        toml::from_str(&contents)
            .map_err(|e| LinmdError::Config(format!("{}: {e}", self.path.display())))
    }
}

/// In-process settings with change notification.
#[derive(Debug)]
pub struct MemorySettingsStore {
    tx: watch::Sender<SyncSettings>,
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new(SyncSettings::default())
    }
}

impl MemorySettingsStore {
    pub fn new(settings: SyncSettings) -> Self {
        let (tx, _rx) = watch::channel(settings);
        Self { tx }
    }

    /// Replace all settings and notify subscribers.
    pub fn replace(&self, settings: SyncSettings) {
        self.tx.send_replace(settings);
    }

    /// Change one key and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`LinmdError::Config`] for an unknown key or invalid value;
    /// the stored settings are left untouched.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = self.tx.borrow().clone();
        settings.set_key(key, value)?;
        self.replace(settings);
        Ok(())
    }

    /// Receive every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<SyncSettings> {
        self.tx.subscribe()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<SyncSettings> {
        Ok(self.tx.borrow().clone())
    }
}
