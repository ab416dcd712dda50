//! gscores-ingest binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and loads the score CSV into it. Command-line flags override the
//! file and `GSCORES_*` environment variables.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use gscores_core::{path::expand_tilde, signal::shutdown_signal};
use gscores_ingest::{BatchLoader, FailurePolicy, IngestConfig};
use gscores_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Load exam scores from CSV into the G-Scores store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// CSV file to load.
  #[arg(long)]
  csv: Option<PathBuf>,

  /// SQLite database file.
  #[arg(long)]
  store: Option<PathBuf>,

  /// Records per write batch.
  #[arg(long)]
  batch_size: Option<usize>,

  /// What to do when a record cannot be written: `abort` or `continue`.
  #[arg(long)]
  on_error: Option<FailurePolicy>,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GSCORES"))
    .build()
    .context("failed to read config file")?;

  let mut cfg: IngestConfig = settings
    .try_deserialize()
    .context("failed to deserialise IngestConfig")?;

  if let Some(csv) = cli.csv {
    cfg.csv_path = csv;
  }
  if let Some(store) = cli.store {
    cfg.store_path = store;
  }
  if let Some(batch_size) = cli.batch_size {
    cfg.batch_size = batch_size;
  }
  if let Some(policy) = cli.on_error {
    cfg.failure_policy = policy;
  }

  let csv_path = expand_tilde(&cfg.csv_path);
  let store_path = expand_tilde(&cfg.store_path);
  anyhow::ensure!(csv_path.is_file(), "CSV file not found at {csv_path:?}");

  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );
  tracing::info!(
    store = %store_path.display(),
    batch_size = cfg.batch_size,
    on_error = %cfg.failure_policy,
    "store ready"
  );

  let loader = BatchLoader::new(Arc::clone(&store), cfg.loader())?;

  // On a signal the batch in flight settles and the run fails with the
  // count of records already committed.
  let outcome = loader.load_path_until(&csv_path, shutdown_signal()).await;

  // Dropping the loader releases its store handle so the connection can close.
  drop(loader);
  match Arc::try_unwrap(store) {
    Ok(store) => store.close().await.context("failed to close store")?,
    Err(_) => tracing::warn!("store still in use; connection closes on exit"),
  }

  let report = outcome.context("import failed")?;
  tracing::info!(
    rows = report.rows_read,
    inserted = report.inserted,
    updated = report.updated,
    rejected = report.rejected.len(),
    failed = report.failed.len(),
    total = report.store_total,
    elapsed_ms = report.elapsed.as_millis() as u64,
    "import completed"
  );
  Ok(())
}
