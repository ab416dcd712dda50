//! Error type for `gscores-ingest`.

use std::path::PathBuf;

use thiserror::Error;

use crate::{phase::LoadPhase, report::WriteFailure};

/// A fatal ingestion error. The run ends in [`LoadPhase::Failed`]; batches
/// written before the error stay committed.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("batch size must be at least 1")]
  ZeroBatchSize,

  #[error("failed to open {path:?}: {source}")]
  Open {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("source has no {0:?} column")]
  MissingColumn(&'static str),

  #[error("csv read error: {0}")]
  Csv(#[from] csv::Error),

  #[error("ingestion task failed after {written} records written: {source}")]
  Join {
    written: u64,
    #[source]
    source:  tokio::task::JoinError,
  },

  #[error("interrupted after {written} records written")]
  Interrupted { written: u64 },

  #[error("{failure}; {written} records written before the run stopped")]
  Write { failure: WriteFailure, written: u64 },

  #[error("verification failed after {written} records written: {source}")]
  Verify {
    written: u64,
    #[source]
    source:  Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("invalid phase transition {from:?} -> {to:?}")]
  InvalidTransition { from: LoadPhase, to: LoadPhase },
}

impl LoadError {
  /// Records committed before the run failed.
  pub fn written(&self) -> u64 {
    match self {
      Self::Write { written, .. }
      | Self::Verify { written, .. }
      | Self::Join { written, .. }
      | Self::Interrupted { written } => *written,
      _ => 0,
    }
  }
}
