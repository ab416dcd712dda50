//! The `ScoreStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `gscores-store-sqlite`
//! and the in-memory [`MemoryStore`](crate::memory::MemoryStore)). The loader
//! and the API depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  record::{NewStudentRecord, RegistrationNumber, StudentRecord},
  report::{GroupAEntry, SubjectDistribution},
};

/// Whether an upsert created a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Inserted,
  Updated,
}

/// Abstraction over a keyed store of student records.
///
/// There is at most one record per registration number. Records are only
/// written through [`ScoreStore::upsert`]; there is no delete path.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ScoreStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert `record`, or overwrite every field of the existing record with
  /// the same registration number except `created_at`.
  ///
  /// Atomic from the caller's point of view: readers never observe a
  /// partially-updated row. Values the schema cannot hold are rejected.
  fn upsert(
    &self,
    record: NewStudentRecord,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  // ── Point reads ───────────────────────────────────────────────────────

  /// Retrieve a record by registration number. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    registration_number: &'a RegistrationNumber,
  ) -> impl Future<Output = Result<Option<StudentRecord>, Self::Error>> + Send + 'a;

  /// Total number of records.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// The first `limit` records ordered by registration number.
  fn sample(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<StudentRecord>, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Band counts per subject; see [`crate::report::subject_distribution`].
  fn subject_distribution(
    &self,
  ) -> impl Future<Output = Result<SubjectDistribution, Self::Error>> + Send + '_;

  /// The best `limit` Group A candidates; see
  /// [`crate::report::top_group_a`].
  fn top_group_a(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<GroupAEntry>, Self::Error>> + Send + '_;
}
