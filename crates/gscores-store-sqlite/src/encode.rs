//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Scores are stored as integer
//! hundredths, rounded half away from zero on the way in.

use chrono::{DateTime, Utc};
use gscores_core::{
  record::{RegistrationNumber, Scores, StudentRecord, Subject, round_score},
  report::GroupAEntry,
};
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Scores ──────────────────────────────────────────────────────────────────

/// Encode one score as hundredths. Range is left to the schema CHECK.
pub fn encode_score(subject: Subject, score: Decimal) -> Result<i64> {
  let mut rounded = round_score(score);
  rounded.rescale(2);
  i64::try_from(rounded.mantissa())
    .map_err(|_| Error::ScoreOverflow { subject, value: score })
}

pub fn decode_score(hundredths: i64) -> Decimal { Decimal::new(hundredths, 2) }

/// Encode all nine scores in canonical column order.
pub fn encode_scores(scores: &Scores) -> Result<[Option<i64>; 9]> {
  let mut out = [None; 9];
  for (subject, score) in scores.iter() {
    out[subject.index()] = score.map(|s| encode_score(subject, s)).transpose()?;
  }
  Ok(out)
}

fn decode_scores(raw: [Option<i64>; 9]) -> Scores {
  let mut scores = Scores::default();
  for subject in Subject::ALL {
    scores.set(subject, raw[subject.index()].map(decode_score));
  }
  scores
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `students` row.
pub struct RawStudent {
  pub sbd:          String,
  pub scores:       [Option<i64>; 9],
  pub ma_ngoai_ngu: Option<String>,
  pub created_at:   String,
}

impl RawStudent {
  /// Read a row selected with [`crate::schema::STUDENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let mut scores = [None; 9];
    for (i, slot) in scores.iter_mut().enumerate() {
      *slot = row.get(i + 1)?;
    }
    Ok(Self {
      sbd: row.get(0)?,
      scores,
      ma_ngoai_ngu: row.get(10)?,
      created_at: row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<StudentRecord> {
    Ok(StudentRecord {
      registration_number:      RegistrationNumber::from_raw(self.sbd)
        .ok_or(gscores_core::Error::MissingRegistrationNumber)?,
      scores:                   decode_scores(self.scores),
      foreign_language_variant: self.ma_ngoai_ngu,
      created_at:               decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from the Group A ranking query.
pub struct RawGroupA {
  pub sbd:     String,
  pub toan:    i64,
  pub vat_li:  i64,
  pub hoa_hoc: i64,
  pub total:   i64,
}

impl RawGroupA {
  pub fn into_entry(self) -> Result<GroupAEntry> {
    Ok(GroupAEntry {
      registration_number: RegistrationNumber::from_raw(self.sbd)
        .ok_or(gscores_core::Error::MissingRegistrationNumber)?,
      mathematics:         decode_score(self.toan),
      physics:             decode_score(self.vat_li),
      chemistry:           decode_score(self.hoa_hoc),
      total_score:         decode_score(self.total),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_encoding_rounds_to_hundredths() {
    let d = |s: &str| s.parse::<Decimal>().unwrap();
    assert_eq!(encode_score(Subject::Mathematics, d("8.4")).unwrap(), 840);
    assert_eq!(encode_score(Subject::Mathematics, d("10")).unwrap(), 1000);
    assert_eq!(encode_score(Subject::Mathematics, d("5.255")).unwrap(), 526);
    assert_eq!(encode_score(Subject::Mathematics, d("5.254")).unwrap(), 525);
    assert_eq!(encode_score(Subject::Mathematics, Decimal::ZERO).unwrap(), 0);
    assert_eq!(decode_score(525), d("5.25"));
  }
}
