//! souche server binary.
//!
//! Reads `souche.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the JSON API or prints the family forest.

mod settings;

use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use souche_api::ApiState;
use souche_core::{forest, recorder::PositionRecorder, store::RelationshipStore};
use souche_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Souche family graph server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "souche.toml")]
  config: std::path::PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API (the default).
  Serve,
  /// Print the forest of the configured store as an indented tree.
  Tree,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,
    Command::Tree => print_tree(&store).await,
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let store = Arc::new(store);
  let (recorder, worker) = PositionRecorder::spawn(Arc::clone(&store), cfg.actor_policy());

  let state = ApiState {
    store,
    recorder,
    capability: cfg.capability(),
    layout: cfg.layout,
  };
  let app = axum::Router::new().nest("/api", souche_api::api_router(state));

  let address = cfg.address();
  tracing::info!(can_edit = cfg.can_edit, "Listening on http://{address}/api");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .context("server error")?;

  // The router held the last recorder handles; let queued history land.
  if let Err(e) = worker.await {
    tracing::error!(error = %e, "history task failed");
  }
  Ok(())
}

async fn print_tree(store: &SqliteStore) -> anyhow::Result<()> {
  let persons = store.list_persons().await.context("failed to list persons")?;
  for root in forest::build(&persons) {
    for (depth, node) in root.walk() {
      if node.description.is_empty() {
        println!("{}{}", "  ".repeat(depth), node.name);
      } else {
        println!("{}{} ({})", "  ".repeat(depth), node.name, node.description);
      }
    }
  }
  Ok(())
}
