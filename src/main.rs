use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repograph::config::{Config, StoreBackend};
use repograph::export::export_graph;
use repograph::pipeline::parse_repository;
use repograph::store::{GraphStore, InMemoryGraphStore, SqliteGraphStore, SqliteStoreConfig};
use repograph::types::ScopeId;

#[derive(Parser)]
#[command(name = "repograph", version, about = "Extract a git repository's object graph into a queryable store")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides config file and environment)
    #[arg(long, global = true, env = "REPOGRAPH_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a repository directory into a graph scope
    Parse {
        /// Directory tree containing the repository (e.g. an extracted archive)
        dir: PathBuf,

        /// Display name for the upload (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// Graph scope id (defaults to a fresh UUID)
        #[arg(long)]
        scope: Option<String>,
    },
    /// Export a graph scope as JSON on stdout
    Export {
        /// Graph scope id printed by `parse`
        scope: String,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `export` output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.store.db_path = db;
    }

    let store: Box<dyn GraphStore> = match config.store.backend {
        StoreBackend::Sqlite => Box::new(
            SqliteGraphStore::new(SqliteStoreConfig {
                path: config.store.db_path.clone(),
                max_connections: config.store.max_connections,
            })
            .await
            .context("Failed to open graph store")?,
        ),
        StoreBackend::Memory => Box::new(InMemoryGraphStore::new()),
    };

    match cli.command {
        Command::Parse { dir, name, scope } => {
            let scope = ScopeId::new(scope.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()));
            let name = name.unwrap_or_else(|| {
                dir.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| dir.display().to_string())
            });

            store.register_upload(&scope, &name).await?;
            let report = parse_repository(&*store, &dir, &scope)
                .await
                .with_context(|| format!("Failed to parse repository under {}", dir.display()))?;

            println!("{scope}");
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Export { scope, pretty } => {
            let scope = ScopeId::new(scope);
            let graph = export_graph(&*store, &scope).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&graph)?
            } else {
                serde_json::to_string(&graph)?
            };
            println!("{json}");
        }
    }

    Ok(())
}
