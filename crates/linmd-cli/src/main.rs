//! linmd: keep markdown files in sync with remote issues and documents.
//!
//! Commands: init, pull, push, status, config
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use linmd_core::SyncSettings;
use linmd_sync::config::{find_workspace_root, STATE_DIR};
use linmd_sync::store::Snapshot;
use linmd_sync::{FileRecordStore, SettingsStore, SyncEngine, TomlSettingsStore};

/// Default record snapshot inside the state directory.
const RECORDS_FILE: &str = "records.json";

#[derive(Parser)]
#[command(name = "linmd")]
#[command(version)]
#[command(about = "Sync markdown files with remote issues and documents")]
struct Cli {
    /// Record snapshot file [default: <workspace>/.linmd/records.json]
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Workspace root [default: nearest directory containing .linmd]
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a .linmd workspace in the current directory
    Init,
    /// Overwrite a file from its remote record
    Pull { file: PathBuf },
    /// Send a file's body and name to its remote record
    Push { file: PathBuf },
    /// Show how a file is linked and where a pull would put it
    Status { file: PathBuf },
    /// Show or change sync settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print all settings
    Show,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

/// Where settings, records and buckets live for this invocation.
struct Workspace {
    /// Bucketing root, if a workspace was found or given.
    root: Option<PathBuf>,
    settings: TomlSettingsStore,
    records: FileRecordStore,
}

impl Workspace {
    fn discover(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let root = match &cli.root {
            Some(root) => Some(root.clone()),
            None => find_workspace_root(&cwd),
        };
        let base = root.clone().unwrap_or(cwd);
        let records = cli
            .store
            .clone()
            .unwrap_or_else(|| base.join(STATE_DIR).join(RECORDS_FILE));
        debug!(
            root = ?root,
            store = %records.display(),
            "workspace resolved"
        );
        Ok(Self {
            root,
            settings: TomlSettingsStore::for_workspace(&base),
            records: FileRecordStore::new(records),
        })
    }

    fn engine(self) -> SyncEngine<FileRecordStore, TomlSettingsStore> {
        let engine = SyncEngine::new(self.records, self.settings);
        match self.root {
            Some(root) => engine.with_root(root),
            None => engine,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Init => init(&cli).await,
        Commands::Pull { file } => {
            let outcome = Workspace::discover(&cli)?
                .engine()
                .pull(file)
                .await
                .with_context(|| format!("pull {} failed", file.display()))?;
            print_json(&json!({
                "type": outcome.reference.kind.as_str(),
                "id": outcome.reference.id,
                "destination": display(&outcome.destination),
                "removed": outcome.removed.as_deref().map(display),
            }))
        }
        Commands::Push { file } => {
            let outcome = Workspace::discover(&cli)?
                .engine()
                .push(file)
                .await
                .with_context(|| format!("push {} failed", file.display()))?;
            print_json(&json!({
                "type": outcome.reference.kind.as_str(),
                "id": outcome.reference.id,
                "record_id": outcome.record_id,
                "title": outcome.title,
                "header_added": outcome.header_added,
            }))
        }
        Commands::Status { file } => {
            let status = Workspace::discover(&cli)?
                .engine()
                .status(file)
                .await
                .with_context(|| format!("status {} failed", file.display()))?;
            let renames = status.plan.renames();
            print_json(&json!({
                "type": status.reference.kind.as_str(),
                "id": status.reference.id,
                "resolved_from": status.reference.source.as_str(),
                "offers_sync_actions": status.offers_sync_actions,
                "title": status.plan.record.title,
                "destination": display(&status.plan.destination),
                "renames": renames,
            }))
        }
        Commands::Config { action } => {
            let settings = Workspace::discover(&cli)?.settings;
            config(&settings, action)
        }
    }
}

async fn init(cli: &Cli) -> Result<()> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let state = root.join(STATE_DIR);
    if state.is_dir() {
        bail!("workspace already initialized at {}", root.display());
    }

    let settings = TomlSettingsStore::for_workspace(&root);
    settings
        .save(&SyncSettings::default())
        .context("failed to write default settings")?;

    let records = cli
        .store
        .clone()
        .unwrap_or_else(|| state.join(RECORDS_FILE));
    if !records.exists() {
        FileRecordStore::new(&records)
            .save(&Snapshot::default())
            .await
            .context("failed to create record snapshot")?;
    }

    print_json(&json!({
        "root": display(&root),
        "config": display(settings.path()),
        "store": display(&records),
    }))
}

fn config(settings: &TomlSettingsStore, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let current = settings.load().context("failed to load settings")?;
            print_json(&serde_json::to_value(current)?)
        }
        ConfigAction::Get { key } => {
            let current = settings.load().context("failed to load settings")?;
            println!("{}", current.get_key(key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let updated = settings
                .set(key, value)
                .with_context(|| format!("failed to set {key}"))?;
            print_json(&serde_json::to_value(updated)?)
        }
    }
}
