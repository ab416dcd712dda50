//! What a run did, reported back to the caller.

use std::{fmt, time::Duration};

use gscores_core::record::RegistrationNumber;

/// A source row excluded before any store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
  /// 1-based line in the source file.
  pub line:   u64,
  pub reason: String,
}

/// A record the store refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
  pub registration_number: RegistrationNumber,
  pub line:                u64,
  pub message:             String,
}

impl fmt::Display for WriteFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "write of {} (line {}) failed: {}",
      self.registration_number, self.line, self.message
    )
  }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
  /// Data rows seen in the source, rejected ones included.
  pub rows_read:   u64,
  pub rejected:    Vec<RowRejection>,
  /// Successful upserts (`inserted + updated`).
  pub written:     u64,
  pub inserted:    u64,
  pub updated:     u64,
  /// Only populated under [`FailurePolicy::Continue`](crate::FailurePolicy).
  pub failed:      Vec<WriteFailure>,
  pub batches:     usize,
  /// Record count of the store after the run.
  pub store_total: u64,
  pub elapsed:     Duration,
}
