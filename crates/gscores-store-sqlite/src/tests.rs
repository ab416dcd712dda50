//! Integration tests for `SqliteStore` against an in-memory database.

use gscores_core::{
  memory::MemoryStore,
  record::{NewStudentRecord, RegistrationNumber, Subject},
  report::{BandCounts, GROUP_A_LIMIT},
  store::{ScoreStore, UpsertOutcome},
};
use rust_decimal::Decimal;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn sbd(s: &str) -> RegistrationNumber { RegistrationNumber::from_raw(s).unwrap() }

fn d(s: &str) -> Decimal { s.parse().unwrap() }

fn record(id: &str, scores: &[(Subject, &str)]) -> NewStudentRecord {
  let mut rec = NewStudentRecord::new(sbd(id));
  for &(subject, score) in scores {
    rec.scores.set(subject, Some(d(score)));
  }
  rec
}

fn group_a(id: &str, toan: &str, vat_li: &str, hoa_hoc: &str) -> NewStudentRecord {
  record(
    id,
    &[
      (Subject::Mathematics, toan),
      (Subject::Physics, vat_li),
      (Subject::Chemistry, hoa_hoc),
    ],
  )
}

// ─── Upsert / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_roundtrip() {
  let s = store().await;

  let mut rec = record(
    "01000001",
    &[
      (Subject::Mathematics, "8.4"),
      (Subject::Literature, "6.75"),
      (Subject::ForeignLanguage, "8.0"),
      (Subject::Physics, "6.0"),
      (Subject::Chemistry, "5.25"),
      (Subject::Biology, "5.0"),
    ],
  );
  rec.foreign_language_variant = Some("N1".into());

  assert_eq!(s.upsert(rec).await.unwrap(), UpsertOutcome::Inserted);

  let fetched = s.get(&sbd("01000001")).await.unwrap().unwrap();
  assert_eq!(fetched.scores.mathematics, Some(d("8.4")));
  assert_eq!(fetched.scores.literature, Some(d("6.75")));
  assert_eq!(fetched.scores.chemistry, Some(d("5.25")));
  assert_eq!(fetched.scores.history, None);
  assert_eq!(fetched.scores.civics, None);
  assert_eq!(fetched.foreign_language_variant.as_deref(), Some("N1"));
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(&sbd("99999999")).await.unwrap().is_none());
}

#[tokio::test]
async fn zero_and_absent_stay_distinct() {
  let s = store().await;
  s.upsert(record("01000003", &[(Subject::Civics, "0")]))
    .await
    .unwrap();

  let fetched = s.get(&sbd("01000003")).await.unwrap().unwrap();
  assert_eq!(fetched.scores.civics, Some(Decimal::ZERO));
  assert_eq!(fetched.scores.geography, None);
}

#[tokio::test]
async fn upsert_overwrites_everything_but_created_at() {
  let s = store().await;

  let mut first = group_a("01000001", "8.4", "6.0", "5.25");
  first.foreign_language_variant = Some("N1".into());
  s.upsert(first).await.unwrap();
  let created = s.get(&sbd("01000001")).await.unwrap().unwrap().created_at;

  let second = record("01000001", &[(Subject::Literature, "9")]);
  assert_eq!(s.upsert(second).await.unwrap(), UpsertOutcome::Updated);

  let fetched = s.get(&sbd("01000001")).await.unwrap().unwrap();
  assert_eq!(fetched.created_at, created);
  assert_eq!(fetched.scores.mathematics, None);
  assert_eq!(fetched.scores.literature, Some(d("9")));
  assert_eq!(fetched.foreign_language_variant, None);
  assert_eq!(s.count().await.unwrap(), 1);
}

#[tokio::test]
async fn scores_are_rounded_to_hundredths() {
  let s = store().await;
  s.upsert(record("01000001", &[(Subject::Biology, "7.125")]))
    .await
    .unwrap();
  let fetched = s.get(&sbd("01000001")).await.unwrap().unwrap();
  assert_eq!(fetched.scores.biology, Some(d("7.13")));
}

// ─── Constraint violations ───────────────────────────────────────────────────

#[tokio::test]
async fn negative_score_is_rejected() {
  let s = store().await;
  let err = s
    .upsert(record("01000001", &[(Subject::Geography, "-1")]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)), "{err}");
  assert_eq!(s.count().await.unwrap(), 0);
}

#[tokio::test]
async fn oversized_score_is_rejected() {
  let s = store().await;
  assert!(
    s.upsert(record("01000001", &[(Subject::History, "100")]))
      .await
      .is_err()
  );
  assert!(matches!(
    s.upsert(record("01000002", &[(Subject::History, "1000000000000000000000000")]))
      .await,
    Err(Error::ScoreOverflow { subject: Subject::History, .. })
  ));
}

#[tokio::test]
async fn overlong_keys_are_rejected() {
  let s = store().await;
  assert!(s.upsert(NewStudentRecord::new(sbd(&"1".repeat(21)))).await.is_err());

  let mut rec = NewStudentRecord::new(sbd("01000001"));
  rec.foreign_language_variant = Some("X".repeat(11));
  assert!(s.upsert(rec).await.is_err());
}

#[tokio::test]
async fn failed_upsert_leaves_existing_row_untouched() {
  let s = store().await;
  s.upsert(group_a("01000001", "8", "8", "8")).await.unwrap();
  assert!(
    s.upsert(group_a("01000001", "9", "9", "-9"))
      .await
      .is_err()
  );
  let fetched = s.get(&sbd("01000001")).await.unwrap().unwrap();
  assert_eq!(fetched.scores.mathematics, Some(d("8")));
}

// ─── Count / sample ──────────────────────────────────────────────────────────

#[tokio::test]
async fn count_and_sample() {
  let s = store().await;
  for id in ["01000003", "01000001", "01000002"] {
    s.upsert(NewStudentRecord::new(sbd(id))).await.unwrap();
  }
  assert_eq!(s.count().await.unwrap(), 3);

  let sample = s.sample(2).await.unwrap();
  let ids: Vec<_> = sample.iter().map(|r| r.registration_number.as_str()).collect();
  assert_eq!(ids, ["01000001", "01000002"]);
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn distribution_buckets_one_score_each() {
  let s = store().await;
  for (i, score) in ["9.0", "7.5", "5.0", "3.0"].into_iter().enumerate() {
    s.upsert(record(&format!("0100000{i}"), &[(Subject::Mathematics, score)]))
      .await
      .unwrap();
  }

  let dist = s.subject_distribution().await.unwrap();
  assert_eq!(
    *dist.get(Subject::Mathematics),
    BandCounts { excellent: 1, good: 1, average: 1, weak: 1 }
  );
  assert_eq!(dist.get(Subject::Physics).total(), 0);
}

#[tokio::test]
async fn distribution_band_edges() {
  let s = store().await;
  for (i, score) in ["8", "7.99", "6", "5.99", "4", "3.99", "0"].into_iter().enumerate() {
    s.upsert(record(&format!("0200000{i}"), &[(Subject::Chemistry, score)]))
      .await
      .unwrap();
  }

  let chem = *s.subject_distribution().await.unwrap().get(Subject::Chemistry);
  assert_eq!(chem, BandCounts { excellent: 1, good: 2, average: 2, weak: 2 });
}

#[tokio::test]
async fn group_a_excludes_incomplete_records() {
  let s = store().await;
  s.upsert(group_a("01000001", "8.4", "6.0", "5.25")).await.unwrap();
  s.upsert(record(
    "01000002",
    &[(Subject::Physics, "10"), (Subject::Chemistry, "10"), (Subject::Biology, "10")],
  ))
  .await
  .unwrap();

  let top = s.top_group_a(GROUP_A_LIMIT).await.unwrap();
  assert_eq!(top.len(), 1);
  assert_eq!(top[0].registration_number.as_str(), "01000001");
  assert_eq!(top[0].total_score, d("19.65"));
}

#[tokio::test]
async fn group_a_is_limited_and_ordered() {
  let s = store().await;
  for i in 0..14u32 {
    let v = format!("{}", 3 + i % 7);
    s.upsert(group_a(&format!("{:08}", 50 - i), &v, &v, &v)).await.unwrap();
  }

  let top = s.top_group_a(GROUP_A_LIMIT).await.unwrap();
  assert_eq!(top.len(), GROUP_A_LIMIT);
  for pair in top.windows(2) {
    assert!(pair[0].total_score >= pair[1].total_score);
    if pair[0].total_score == pair[1].total_score {
      assert!(pair[0].registration_number < pair[1].registration_number);
    }
  }
}

#[tokio::test]
async fn sql_reports_agree_with_full_scan() {
  let sqlite = store().await;
  let memory = MemoryStore::new();

  let rows = [
    group_a("01000001", "8.4", "6.0", "5.25"),
    group_a("01000002", "9.2", "9.5", "9.25"),
    group_a("01000003", "9.2", "9.5", "9.25"),
    group_a("01000004", "0", "0", "0"),
    record("01000005", &[(Subject::Mathematics, "10"), (Subject::Civics, "7.75")]),
    record("01000006", &[(Subject::Literature, "4"), (Subject::History, "3.5")]),
    group_a("01000007", "5.6", "7.25", "6"),
    group_a("01000008", "7.995", "3.994", "5.125"),
    record("01000009", &[(Subject::Biology, "5.995"), (Subject::Geography, "-0.001")]),
  ];
  for row in rows {
    sqlite.upsert(row.clone()).await.unwrap();
    memory.upsert(row).await.unwrap();
  }

  assert_eq!(
    sqlite.subject_distribution().await.unwrap(),
    memory.subject_distribution().await.unwrap()
  );
  assert_eq!(
    sqlite.top_group_a(GROUP_A_LIMIT).await.unwrap(),
    memory.top_group_a(GROUP_A_LIMIT).await.unwrap()
  );
}
