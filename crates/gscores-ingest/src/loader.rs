//! [`BatchLoader`]: drives a run from source to verified store.

use std::{
  collections::HashMap,
  fs::File,
  io::{BufReader, Read},
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Instant,
};

use gscores_core::{
  record::RegistrationNumber,
  store::{ScoreStore, UpsertOutcome},
};
use tokio::{
  sync::{Mutex, watch},
  task::{JoinError, JoinSet},
};

use crate::{
  config::{FailurePolicy, LoaderConfig},
  error::LoadError,
  phase::{LoadPhase, PhaseTracker},
  report::{LoadReport, WriteFailure},
  source::{SourceRecord, read_source},
};

/// Records shown by the post-run verification log.
const VERIFY_SAMPLE: usize = 3;

/// Loads CSV sources into a [`ScoreStore`].
///
/// One loader runs one ingestion at a time; a second call waits for the
/// first to finish.
pub struct BatchLoader<S> {
  store:       Arc<S>,
  config:      LoaderConfig,
  phase:       PhaseTracker,
  run_lock:    Mutex<()>,
  interrupted: Arc<AtomicBool>,
}

/// Stops a loader's run at the next batch boundary.
///
/// The batch in flight settles first, and the run fails with
/// [`LoadError::Interrupted`]. A cancel issued while the loader is idle
/// stops its next run before the first batch.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
  pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }
}

/// Result of writing one chain of same-key records.
#[derive(Default)]
struct ChainOutcome {
  inserted: u64,
  updated:  u64,
  failures: Vec<WriteFailure>,
}

impl ChainOutcome {
  fn merge(&mut self, other: ChainOutcome) {
    self.inserted += other.inserted;
    self.updated += other.updated;
    self.failures.extend(other.failures);
  }
}

impl<S> BatchLoader<S>
where
  S: ScoreStore + 'static,
{
  pub fn new(store: Arc<S>, config: LoaderConfig) -> Result<Self, LoadError> {
    if config.batch_size == 0 {
      return Err(LoadError::ZeroBatchSize);
    }
    Ok(Self {
      store,
      config,
      phase: PhaseTracker::new(),
      run_lock: Mutex::new(()),
      interrupted: Arc::new(AtomicBool::new(false)),
    })
  }

  pub fn phase(&self) -> LoadPhase { self.phase.current() }

  /// Watch phase changes of this loader's runs.
  pub fn subscribe(&self) -> watch::Receiver<LoadPhase> { self.phase.subscribe() }

  pub fn cancel_handle(&self) -> CancelHandle { CancelHandle(Arc::clone(&self.interrupted)) }

  /// Open the CSV file at `path` and load it.
  pub async fn load_path(&self, path: impl AsRef<Path>) -> Result<LoadReport, LoadError> {
    self.load_reader(open(path.as_ref())?).await
  }

  /// Like [`load_path`](Self::load_path), but once `shutdown` resolves the
  /// run is cancelled and awaited until the current batch has settled.
  pub async fn load_path_until<F>(
    &self,
    path: impl AsRef<Path>,
    shutdown: F,
  ) -> Result<LoadReport, LoadError>
  where
    F: Future<Output = ()>,
  {
    self.load_reader_until(open(path.as_ref())?, shutdown).await
  }

  /// Like [`load_reader`](Self::load_reader), but once `shutdown` resolves
  /// the run is cancelled and awaited until the current batch has settled.
  pub async fn load_reader_until<R, F>(
    &self,
    reader: R,
    shutdown: F,
  ) -> Result<LoadReport, LoadError>
  where
    R: Read + Send + 'static,
    F: Future<Output = ()>,
  {
    let load = self.load_reader(reader);
    tokio::pin!(load);
    tokio::select! {
      res = &mut load => res,
      () = shutdown => {
        tracing::warn!("shutdown requested; settling the current batch");
        self.cancel_handle().cancel();
        load.await
      }
    }
  }

  /// Load every row of `reader`. On error the phase ends in
  /// [`LoadPhase::Failed`] and batches already written stay written.
  pub async fn load_reader<R>(&self, reader: R) -> Result<LoadReport, LoadError>
  where
    R: Read + Send + 'static,
  {
    let _guard = self.run_lock.lock().await;
    self.phase.reset();

    let result = self.run(reader).await;
    self.interrupted.store(false, Ordering::SeqCst);
    if let Err(e) = &result {
      self.phase.fail();
      tracing::error!(written = e.written(), "load failed: {e}");
    }
    result
  }

  async fn run<R>(&self, reader: R) -> Result<LoadReport, LoadError>
  where
    R: Read + Send + 'static,
  {
    let started = Instant::now();

    // ── Reading ─────────────────────────────────────────────────────────
    self.phase.advance(LoadPhase::Reading)?;
    let read = tokio::task::spawn_blocking(move || read_source(reader))
      .await
      .map_err(|source| LoadError::Join { written: 0, source })??;

    let mut report = LoadReport {
      rows_read: read.rows_read,
      rejected: read.rejected,
      ..LoadReport::default()
    };

    // ── Writing ─────────────────────────────────────────────────────────
    let batch_size = self.config.batch_size;
    let total = read.records.len();
    let of = total.div_ceil(batch_size);
    let mut records = read.records.into_iter();

    for batch in 1..=of {
      if self.interrupted.load(Ordering::SeqCst) {
        return Err(LoadError::Interrupted { written: report.written });
      }
      self.phase.advance(LoadPhase::Writing { batch, of })?;
      let chunk: Vec<SourceRecord> = records.by_ref().take(batch_size).collect();

      let (outcome, panicked) = self.write_batch(chunk).await;
      report.inserted += outcome.inserted;
      report.updated += outcome.updated;
      report.written = report.inserted + report.updated;
      report.batches = batch;

      if let Some(source) = panicked {
        return Err(LoadError::Join { written: report.written, source });
      }

      match self.config.failure_policy {
        FailurePolicy::Abort => {
          if let Some(failure) = outcome.failures.into_iter().min_by_key(|f| f.line) {
            return Err(LoadError::Write { failure, written: report.written });
          }
        }
        FailurePolicy::Continue => report.failed.extend(outcome.failures),
      }

      tracing::info!(
        batch,
        of,
        written = report.written,
        remaining = total.saturating_sub(batch * batch_size),
        "batch committed"
      );
    }

    // ── Verifying ───────────────────────────────────────────────────────
    self.phase.advance(LoadPhase::Verifying)?;
    let written = report.written;
    let verify = |e: S::Error| LoadError::Verify { written, source: Box::new(e) };

    report.store_total = self.store.count().await.map_err(verify)?;
    let sample = self.store.sample(VERIFY_SAMPLE).await.map_err(verify)?;
    tracing::info!(total = report.store_total, "store verified");
    for record in &sample {
      tracing::info!(
        sbd = %record.registration_number,
        toan = ?record.scores.mathematics,
        ngu_van = ?record.scores.literature,
        ngoai_ngu = ?record.scores.foreign_language,
        "sample record"
      );
    }

    self.phase.advance(LoadPhase::Done)?;
    report.elapsed = started.elapsed();
    tracing::info!(
      rows = report.rows_read,
      written = report.written,
      rejected = report.rejected.len(),
      failed = report.failed.len(),
      elapsed_ms = report.elapsed.as_millis() as u64,
      "load finished"
    );
    Ok(report)
  }

  /// Write one batch. Records sharing a registration number form a chain
  /// written in source order; distinct chains run concurrently. Every chain
  /// runs to completion (or to its first failure under
  /// [`FailurePolicy::Abort`]) before this returns, along with the first
  /// chain task that did not finish.
  async fn write_batch(&self, batch: Vec<SourceRecord>) -> (ChainOutcome, Option<JoinError>) {
    let mut index: HashMap<RegistrationNumber, usize> = HashMap::new();
    let mut chains: Vec<Vec<SourceRecord>> = Vec::new();
    for record in batch {
      let key = record.record.registration_number.clone();
      match index.get(&key) {
        Some(&i) => chains[i].push(record),
        None => {
          index.insert(key, chains.len());
          chains.push(vec![record]);
        }
      }
    }

    let mut set = JoinSet::new();
    for chain in chains {
      let store = Arc::clone(&self.store);
      let policy = self.config.failure_policy;
      set.spawn(async move { write_chain(store.as_ref(), chain, policy).await });
    }

    let mut outcome = ChainOutcome::default();
    let mut panicked = None;
    while let Some(joined) = set.join_next().await {
      match joined {
        Ok(chain) => outcome.merge(chain),
        Err(e) => {
          tracing::error!("chain task failed: {e}");
          panicked.get_or_insert(e);
        }
      }
    }
    (outcome, panicked)
  }
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
  let file = File::open(path).map_err(|source| LoadError::Open {
    path: path.to_path_buf(),
    source,
  })?;
  tracing::info!(path = %path.display(), "loading scores");
  Ok(BufReader::new(file))
}

async fn write_chain<S: ScoreStore>(
  store: &S,
  chain: Vec<SourceRecord>,
  policy: FailurePolicy,
) -> ChainOutcome {
  let mut outcome = ChainOutcome::default();
  for SourceRecord { line, record } in chain {
    let registration_number = record.registration_number.clone();
    match store.upsert(record).await {
      Ok(UpsertOutcome::Inserted) => outcome.inserted += 1,
      Ok(UpsertOutcome::Updated) => outcome.updated += 1,
      Err(e) => {
        tracing::warn!(sbd = %registration_number, line, "write failed: {e}");
        outcome.failures.push(WriteFailure {
          registration_number,
          line,
          message: e.to_string(),
        });
        if policy == FailurePolicy::Abort {
          break;
        }
      }
    }
  }
  outcome
}
