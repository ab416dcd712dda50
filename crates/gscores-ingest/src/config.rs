//! Loader and ingest-binary configuration.

use std::{fmt, path::PathBuf, str::FromStr};

use serde::Deserialize;

/// Records per write batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// What a run does when a single upsert fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
  /// Stop after the current batch settles and fail the run.
  #[default]
  Abort,
  /// Record the failed row in the report and keep going.
  Continue,
}

impl FromStr for FailurePolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "abort" => Ok(Self::Abort),
      "continue" => Ok(Self::Continue),
      other => Err(format!("unknown failure policy {other:?} (expected abort|continue)")),
    }
  }
}

impl fmt::Display for FailurePolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Abort => "abort",
      Self::Continue => "continue",
    })
  }
}

/// Settings for a [`BatchLoader`](crate::BatchLoader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
  pub batch_size:     usize,
  pub failure_policy: FailurePolicy,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      batch_size:     DEFAULT_BATCH_SIZE,
      failure_policy: FailurePolicy::default(),
    }
  }
}

/// Runtime configuration of the `gscores-ingest` binary, deserialised from
/// `config.toml` and `GSCORES_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  pub store_path:     PathBuf,
  pub csv_path:       PathBuf,
  pub batch_size:     usize,
  pub failure_policy: FailurePolicy,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      store_path:     PathBuf::from("gscores.db"),
      csv_path:       PathBuf::from("diem_thi_thpt_2024.csv"),
      batch_size:     DEFAULT_BATCH_SIZE,
      failure_policy: FailurePolicy::Abort,
    }
  }
}

impl IngestConfig {
  pub fn loader(&self) -> LoaderConfig {
    LoaderConfig {
      batch_size:     self.batch_size,
      failure_policy: self.failure_policy,
    }
  }
}
