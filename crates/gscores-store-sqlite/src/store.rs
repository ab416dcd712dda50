//! [`SqliteStore`]: the SQLite implementation of [`ScoreStore`].
//!
//! Both reports are pushed down into SQL. The ranking query orders by total
//! descending, then `sbd` ascending, matching
//! [`GroupAEntry::rank_cmp`](gscores_core::report::GroupAEntry::rank_cmp).

use std::path::Path;

use chrono::Utc;
use gscores_core::{
  record::{NewStudentRecord, RegistrationNumber, StudentRecord, Subject},
  report::{
    AVERAGE_MIN, BandCounts, EXCELLENT_MIN, GOOD_MIN, GroupAEntry, SubjectDistribution,
  },
  store::{ScoreStore, UpsertOutcome},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{RawGroupA, RawStudent, encode_dt, encode_score, encode_scores},
  schema::{SCHEMA, STUDENT_COLUMNS},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A score store backed by a single SQLite file.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, flushing any pending work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }
}

/// `SELECT` list for the distribution query: four conditional counts per
/// subject, in [`Subject::ALL`] order.
fn distribution_sql() -> Result<String> {
  let columns = Subject::ALL
    .iter()
    .map(|&s| {
      let excellent = encode_score(s, EXCELLENT_MIN)?;
      let good = encode_score(s, GOOD_MIN)?;
      let average = encode_score(s, AVERAGE_MIN)?;
      let c = s.code();
      Ok(format!(
        "COUNT(CASE WHEN {c} >= {excellent} THEN 1 END),
         COUNT(CASE WHEN {c} >= {good} AND {c} < {excellent} THEN 1 END),
         COUNT(CASE WHEN {c} >= {average} AND {c} < {good} THEN 1 END),
         COUNT(CASE WHEN {c} < {average} THEN 1 END)"
      ))
    })
    .collect::<Result<Vec<String>>>()?;

  Ok(format!("SELECT {} FROM students", columns.join(",\n")))
}

// ─── ScoreStore impl ─────────────────────────────────────────────────────────

impl ScoreStore for SqliteStore {
  type Error = crate::Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert(&self, record: NewStudentRecord) -> Result<UpsertOutcome> {
    let sbd     = record.registration_number.into_inner();
    let scores  = encode_scores(&record.scores)?;
    let variant = record.foreign_language_variant;
    let now_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existed = tx
          .query_row(
            "SELECT 1 FROM students WHERE sbd = ?1",
            rusqlite::params![sbd],
            |_| Ok(()),
          )
          .optional()?
          .is_some();

        tx.execute(
          "INSERT INTO students (
             sbd, toan, ngu_van, ngoai_ngu, vat_li, hoa_hoc,
             sinh_hoc, lich_su, dia_li, gdcd, ma_ngoai_ngu, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
           ON CONFLICT (sbd) DO UPDATE SET
             toan         = excluded.toan,
             ngu_van      = excluded.ngu_van,
             ngoai_ngu    = excluded.ngoai_ngu,
             vat_li       = excluded.vat_li,
             hoa_hoc      = excluded.hoa_hoc,
             sinh_hoc     = excluded.sinh_hoc,
             lich_su      = excluded.lich_su,
             dia_li       = excluded.dia_li,
             gdcd         = excluded.gdcd,
             ma_ngoai_ngu = excluded.ma_ngoai_ngu",
          rusqlite::params![
            sbd, scores[0], scores[1], scores[2], scores[3], scores[4],
            scores[5], scores[6], scores[7], scores[8], variant, now_str,
          ],
        )?;
        tx.commit()?;

        Ok(if existed { UpsertOutcome::Updated } else { UpsertOutcome::Inserted })
      })
      .await?;

    Ok(outcome)
  }

  // ── Point reads ───────────────────────────────────────────────────────────

  async fn get(&self, registration_number: &RegistrationNumber) -> Result<Option<StudentRecord>> {
    let sbd = registration_number.as_str().to_owned();

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE sbd = ?1"),
            rusqlite::params![sbd],
            RawStudent::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStudent::into_record).transpose()
  }

  async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?))
      .await?;
    Ok(n.max(0) as u64)
  }

  async fn sample(&self, limit: usize) -> Result<Vec<StudentRecord>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDENT_COLUMNS} FROM students ORDER BY sbd LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawStudent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStudent::into_record).collect()
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn subject_distribution(&self) -> Result<SubjectDistribution> {
    let sql = distribution_sql()?;

    let counts: Vec<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, [], |row| {
          (0..Subject::ALL.len() * 4)
            .map(|i| row.get::<_, i64>(i))
            .collect::<rusqlite::Result<Vec<_>>>()
        })?)
      })
      .await?;

    let mut dist = SubjectDistribution::default();
    for (subject, chunk) in Subject::ALL.into_iter().zip(counts.chunks_exact(4)) {
      *dist.get_mut(subject) = BandCounts {
        excellent: chunk[0].max(0) as u64,
        good:      chunk[1].max(0) as u64,
        average:   chunk[2].max(0) as u64,
        weak:      chunk[3].max(0) as u64,
      };
    }
    Ok(dist)
  }

  async fn top_group_a(&self, limit: usize) -> Result<Vec<GroupAEntry>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawGroupA> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT sbd, toan, vat_li, hoa_hoc, toan + vat_li + hoa_hoc AS total
           FROM students
           WHERE toan IS NOT NULL AND vat_li IS NOT NULL AND hoa_hoc IS NOT NULL
           ORDER BY total DESC, sbd ASC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawGroupA {
              sbd:     row.get(0)?,
              toan:    row.get(1)?,
              vat_li:  row.get(2)?,
              hoa_hoc: row.get(3)?,
              total:   row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGroupA::into_entry).collect()
  }
}
