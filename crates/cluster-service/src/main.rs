//! # cluster
//!
//! Command-line access to the cluster store. Prints JSON on stdout and exits
//! with a code derived from the operation outcome.

#![deny(unsafe_code)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cluster_core::{Cluster, ClusterId, FieldId, OutcomeKind, RigId};
use cluster_service::{ClusterService, ServiceError, exit_code};
use cluster_settings::{ClusterSettings, DatabaseSettings};
use cluster_store::{ClusterFilter, ClusterStore, ConnectionConfig, StoreError};
use cluster_usage::UsageTracker;
use serde_json::{Value, json};
use tracing::warn;

/// Drilling-site cluster store.
#[derive(Parser, Debug)]
#[command(name = "cluster", about = "Drilling-site cluster store")]
struct Cli {
    /// Settings file (default: `~/.cluster/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Path to the `SQLite` database (overrides settings).
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Path to the usage history file (overrides settings).
    #[arg(long, global = true)]
    usage_path: Option<PathBuf>,

    /// Log filter, e.g. `info` or `cluster_store=debug` (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every cluster identifier.
    Ids,
    /// List every cluster header.
    Headers,
    /// Print one cluster.
    Get {
        /// Cluster identifier.
        id: ClusterId,
    },
    /// Print every cluster (`null` for unreadable rows).
    All,
    /// Add a cluster read from a JSON file, or `-` for stdin.
    Add {
        /// Source file.
        source: PathBuf,
    },
    /// Replace a cluster with one read from a JSON file, or `-` for stdin.
    Update {
        /// Cluster identifier.
        id: ClusterId,
        /// Source file.
        source: PathBuf,
    },
    /// Delete one cluster.
    Delete {
        /// Cluster identifier.
        id: ClusterId,
    },
    /// Print the number of stored clusters.
    Count,
    /// Delete every cluster.
    Clear,
    /// List identifiers of clusters matching the given projections.
    Find {
        /// Field identifier.
        #[arg(long)]
        field: Option<FieldId>,
        /// Rig identifier.
        #[arg(long)]
        rig: Option<RigId>,
        /// Single-well flag.
        #[arg(long)]
        single_well: Option<bool>,
        /// Fixed-platform flag.
        #[arg(long)]
        fixed_platform: Option<bool>,
    },
    /// Print usage statistics.
    Usage,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut ClusterSettings) {
        if let Some(ref path) = self.db_path {
            settings.database.path.clone_from(path);
        }
        if let Some(ref path) = self.usage_path {
            settings.usage.path.clone_from(path);
        }
        if let Some(ref level) = self.log_level {
            settings.logging.level.clone_from(level);
        }
    }
}

fn connection_config(db: &DatabaseSettings) -> ConnectionConfig {
    ConnectionConfig {
        pool_size: db.pool_size,
        busy_timeout_ms: db.busy_timeout_ms,
        connection_timeout: db.connection_timeout(),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn read_cluster(source: &Path) -> cluster_service::Result<Cluster> {
    let text = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        std::fs::read_to_string(source)
    }
    .map_err(|e| ServiceError::InvalidArgument(format!("cannot read {}: {e}", source.display())))?;
    parse_cluster(&text)
}

fn parse_cluster(text: &str) -> cluster_service::Result<Cluster> {
    serde_json::from_str(text)
        .map_err(|e| ServiceError::InvalidArgument(format!("invalid cluster JSON: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> cluster_service::Result<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Serde(e).into())
}

fn success() -> Value {
    json!({ "outcome": OutcomeKind::Success })
}

fn dispatch(service: &ClusterService, command: Command) -> cluster_service::Result<Value> {
    match command {
        Command::Ids => to_json(&service.all_ids()?),
        Command::Headers => to_json(&service.all_meta_info()?),
        Command::Get { id } => to_json(&service.by_id(id)?),
        Command::All => to_json(&service.all()?),
        Command::Add { source } => {
            service.post(&read_cluster(&source)?)?;
            Ok(success())
        }
        Command::Update { id, source } => {
            service.put_by_id(id, &read_cluster(&source)?)?;
            Ok(success())
        }
        Command::Delete { id } => {
            service.delete_by_id(id)?;
            Ok(success())
        }
        Command::Count => Ok(json!(service.count()?)),
        Command::Clear => Ok(json!({ "deleted": service.clear()? })),
        Command::Find {
            field,
            rig,
            single_well,
            fixed_platform,
        } => {
            let filter = ClusterFilter {
                field_id: field,
                rig_id: rig,
                is_single_well: single_well,
                is_fixed_platform: fixed_platform,
            };
            to_json(&service.find(&filter)?)
        }
        Command::Usage => to_json(&service.usage_statistics()),
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = match cli.settings {
        Some(ref path) => cluster_settings::load_settings_from_path(path),
        None => cluster_settings::load_settings(),
    }
    .context("Failed to load settings")?;
    cli.apply_overrides(&mut settings);

    cluster_core::logging::init_subscriber(&settings.logging.level);

    let db_path = &settings.database.path;
    ensure_parent_dir(db_path)?;
    let store = ClusterStore::open(db_path, &connection_config(&settings.database))
        .with_context(|| format!("Failed to open cluster store: {}", db_path.display()))?;

    let usage = Arc::new(UsageTracker::load_or_create(
        settings.usage.path.clone(),
        settings.usage.backup_interval(),
    ));
    let service = ClusterService::new(store, Arc::clone(&usage));

    let outcome = dispatch(&service, cli.command);

    if let Err(e) = usage.flush() {
        warn!(path = %usage.path().display(), error = %e, "failed to flush usage history");
    }

    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let kind = e.kind();
            eprintln!("{kind}: {e}");
            Ok(ExitCode::from(exit_code(kind)))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(OutcomeKind::InternalError))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use clap::CommandFactory;

    use super::*;

    fn service(dir: &Path) -> ClusterService {
        let usage = Arc::new(UsageTracker::load_or_create(
            dir.join("history.json"),
            Duration::from_secs(300),
        ));
        ClusterService::new(ClusterStore::in_memory().unwrap(), usage)
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_get_with_id() {
        let id = ClusterId::new();
        let cli = Cli::try_parse_from(["cluster", "get", &id.to_string()]).unwrap();
        assert_matches!(cli.command, Command::Get { id: parsed } if parsed == id);
    }

    #[test]
    fn rejects_malformed_id() {
        assert!(Cli::try_parse_from(["cluster", "delete", "not-a-uuid"]).is_err());
    }

    #[test]
    fn global_overrides_apply() {
        let cli = Cli::try_parse_from([
            "cluster",
            "count",
            "--db-path",
            "/tmp/c.db",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let mut settings = ClusterSettings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.database.path, PathBuf::from("/tmp/c.db"));
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.usage, cluster_settings::UsageSettings::default());
    }

    #[test]
    fn parses_find_flags() {
        let cli =
            Cli::try_parse_from(["cluster", "find", "--single-well", "true"]).unwrap();
        assert_matches!(
            cli.command,
            Command::Find {
                field: None,
                rig: None,
                single_well: Some(true),
                fixed_platform: None
            }
        );
    }

    #[test]
    fn bad_json_is_invalid_argument() {
        assert_matches!(parse_cluster("{"), Err(ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn missing_source_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            read_cluster(&dir.path().join("missing.json")),
            Err(ServiceError::InvalidArgument(_))
        );
    }

    #[test]
    fn dispatch_add_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let cluster = Cluster::with_id(ClusterId::new());
        let id = cluster.id().unwrap();
        let source = dir.path().join("cluster.json");
        std::fs::write(&source, serde_json::to_string(&cluster).unwrap()).unwrap();

        let added = dispatch(&service, Command::Add { source: source.clone() }).unwrap();
        assert_eq!(added["outcome"], "success");

        let fetched = dispatch(&service, Command::Get { id }).unwrap();
        assert_eq!(fetched["metaInfo"]["id"], id.to_string());

        let err = dispatch(&service, Command::Add { source }).unwrap_err();
        assert_eq!(exit_code(err.kind()), 4);

        let _ = dispatch(&service, Command::Delete { id }).unwrap();
        let err = dispatch(&service, Command::Get { id }).unwrap_err();
        assert_eq!(exit_code(err.kind()), 3);

        assert_eq!(dispatch(&service, Command::Count).unwrap(), json!(0));
    }

    #[test]
    fn ensure_parent_dir_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("home").join("Cluster.db");
        ensure_parent_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
        ensure_parent_dir(Path::new("Cluster.db")).unwrap();
    }
}
