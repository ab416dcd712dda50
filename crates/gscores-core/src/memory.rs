//! [`MemoryStore`]: a process-local [`ScoreStore`].
//!
//! Records live in a `BTreeMap` keyed by registration number, so iteration
//! is already in key order. Both reports run as full scans through
//! [`crate::report`].

use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
  Error, Result,
  record::{NewStudentRecord, RegistrationNumber, StudentRecord},
  report::{self, GroupAEntry, SubjectDistribution},
  store::{ScoreStore, UpsertOutcome},
};

/// An in-memory store with the same precision and constraints as the
/// persisted schema.
///
/// Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
  records: Arc<RwLock<BTreeMap<RegistrationNumber, StudentRecord>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl ScoreStore for MemoryStore {
  type Error = Error;

  async fn upsert(&self, mut record: NewStudentRecord) -> Result<UpsertOutcome> {
    record.scores = record.scores.rounded();
    record.validate()?;

    let mut records = self.records.write().await;
    let key = record.registration_number.clone();
    let (created_at, outcome) = match records.get(&key) {
      Some(existing) => (existing.created_at, UpsertOutcome::Updated),
      None => (Utc::now(), UpsertOutcome::Inserted),
    };
    records.insert(key, StudentRecord::from_new(record, created_at));
    Ok(outcome)
  }

  async fn get(&self, registration_number: &RegistrationNumber) -> Result<Option<StudentRecord>> {
    Ok(self.records.read().await.get(registration_number).cloned())
  }

  async fn count(&self) -> Result<u64> { Ok(self.records.read().await.len() as u64) }

  async fn sample(&self, limit: usize) -> Result<Vec<StudentRecord>> {
    Ok(self.records.read().await.values().take(limit).cloned().collect())
  }

  async fn subject_distribution(&self) -> Result<SubjectDistribution> {
    Ok(report::subject_distribution(self.records.read().await.values()))
  }

  async fn top_group_a(&self, limit: usize) -> Result<Vec<GroupAEntry>> {
    Ok(report::top_group_a(self.records.read().await.values(), limit))
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal::Decimal;

  use super::*;
  use crate::record::Subject;

  fn sbd(s: &str) -> RegistrationNumber { RegistrationNumber::from_raw(s).unwrap() }

  #[tokio::test]
  async fn upsert_overwrites_but_keeps_created_at() {
    let store = MemoryStore::new();

    let mut first = NewStudentRecord::new(sbd("01000001"));
    first.scores.set(Subject::Mathematics, Some(Decimal::new(84, 1)));
    first.foreign_language_variant = Some("N1".into());
    assert_eq!(store.upsert(first).await.unwrap(), UpsertOutcome::Inserted);
    let created = store.get(&sbd("01000001")).await.unwrap().unwrap().created_at;

    let second = NewStudentRecord::new(sbd("01000001"));
    assert_eq!(store.upsert(second).await.unwrap(), UpsertOutcome::Updated);

    let rec = store.get(&sbd("01000001")).await.unwrap().unwrap();
    assert_eq!(rec.created_at, created);
    assert_eq!(rec.scores.mathematics, None);
    assert_eq!(rec.foreign_language_variant, None);
    assert_eq!(store.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn rejects_out_of_range_score() {
    let store = MemoryStore::new();
    let mut rec = NewStudentRecord::new(sbd("01000001"));
    rec.scores.set(Subject::Physics, Some(Decimal::new(-5, 0)));
    assert!(store.upsert(rec).await.is_err());
    assert_eq!(store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn scores_are_stored_at_hundredths() {
    let store = MemoryStore::new();
    let mut rec = NewStudentRecord::new(sbd("01000001"));
    rec.scores.set(Subject::Mathematics, Some(Decimal::new(7995, 3)));
    rec.scores.set(Subject::Civics, Some(Decimal::new(-1, 3)));
    store.upsert(rec).await.unwrap();

    let stored = store.get(&sbd("01000001")).await.unwrap().unwrap();
    assert_eq!(stored.scores.mathematics, Some(Decimal::new(800, 2)));
    assert_eq!(stored.scores.civics, Some(Decimal::ZERO));

    let dist = store.subject_distribution().await.unwrap();
    assert_eq!(dist.get(Subject::Mathematics).excellent, 1);
  }

  #[tokio::test]
  async fn sample_is_key_ordered() {
    let store = MemoryStore::new();
    for s in ["03", "01", "02"] {
      store.upsert(NewStudentRecord::new(sbd(s))).await.unwrap();
    }
    let keys: Vec<_> = store
      .sample(2)
      .await
      .unwrap()
      .into_iter()
      .map(|r| r.registration_number.into_inner())
      .collect();
    assert_eq!(keys, ["01", "02"]);
  }
}
