//! Student records, one row per exam candidate.
//!
//! A record is keyed by its registration number (`sbd`). Every subject score
//! is optional: `None` means the candidate did not sit the subject, which is
//! not the same thing as a score of zero.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum stored length of a registration number.
pub const REGISTRATION_NUMBER_MAX_LEN: usize = 20;

/// Maximum stored length of a foreign-language variant code.
pub const VARIANT_CODE_MAX_LEN: usize = 10;

/// Largest score a DECIMAL(4,2) column can hold.
pub const SCORE_MAX: Decimal = Decimal::from_parts(9999, 0, 0, false, 2);

/// Round a score to the stored precision, two places, half away from zero.
/// Negative values that round to zero become plain zero.
pub fn round_score(score: Decimal) -> Decimal {
  let rounded = score.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  if rounded.is_zero() { Decimal::ZERO } else { rounded }
}

// ─── Registration number ─────────────────────────────────────────────────────

/// A candidate's registration number (`sbd`).
///
/// Ingestion passes the value through verbatim; the API only accepts the
/// 8-digit form (see [`RegistrationNumber::parse_lookup`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationNumber(String);

impl RegistrationNumber {
  /// Wrap a raw value from the source file. Returns `None` for an empty
  /// string, since a record cannot be keyed without one.
  pub fn from_raw(raw: impl Into<String>) -> Option<Self> {
    let raw = raw.into();
    (!raw.is_empty()).then_some(Self(raw))
  }

  /// Validate a lookup key: exactly eight ASCII digits.
  pub fn parse_lookup(s: &str) -> Result<Self> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidRegistrationNumber(s.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for RegistrationNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

/// The nine examined subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
  #[serde(rename = "toan")]
  Mathematics,
  #[serde(rename = "ngu_van")]
  Literature,
  #[serde(rename = "ngoai_ngu")]
  ForeignLanguage,
  #[serde(rename = "vat_li")]
  Physics,
  #[serde(rename = "hoa_hoc")]
  Chemistry,
  #[serde(rename = "sinh_hoc")]
  Biology,
  #[serde(rename = "lich_su")]
  History,
  #[serde(rename = "dia_li")]
  Geography,
  #[serde(rename = "gdcd")]
  Civics,
}

impl Subject {
  /// All subjects in canonical (column) order.
  pub const ALL: [Subject; 9] = [
    Subject::Mathematics,
    Subject::Literature,
    Subject::ForeignLanguage,
    Subject::Physics,
    Subject::Chemistry,
    Subject::Biology,
    Subject::History,
    Subject::Geography,
    Subject::Civics,
  ];

  /// Column / wire name used by the source CSV, the database and the API.
  pub fn code(self) -> &'static str {
    match self {
      Subject::Mathematics => "toan",
      Subject::Literature => "ngu_van",
      Subject::ForeignLanguage => "ngoai_ngu",
      Subject::Physics => "vat_li",
      Subject::Chemistry => "hoa_hoc",
      Subject::Biology => "sinh_hoc",
      Subject::History => "lich_su",
      Subject::Geography => "dia_li",
      Subject::Civics => "gdcd",
    }
  }

  /// Position of this subject in [`Subject::ALL`].
  pub fn index(self) -> usize { self as usize }
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

// ─── Scores ──────────────────────────────────────────────────────────────────

/// The nine optional subject scores of one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
  #[serde(rename = "toan")]
  pub mathematics:      Option<Decimal>,
  #[serde(rename = "ngu_van")]
  pub literature:       Option<Decimal>,
  #[serde(rename = "ngoai_ngu")]
  pub foreign_language: Option<Decimal>,
  #[serde(rename = "vat_li")]
  pub physics:          Option<Decimal>,
  #[serde(rename = "hoa_hoc")]
  pub chemistry:        Option<Decimal>,
  #[serde(rename = "sinh_hoc")]
  pub biology:          Option<Decimal>,
  #[serde(rename = "lich_su")]
  pub history:          Option<Decimal>,
  #[serde(rename = "dia_li")]
  pub geography:        Option<Decimal>,
  #[serde(rename = "gdcd")]
  pub civics:           Option<Decimal>,
}

impl Scores {
  pub fn get(&self, subject: Subject) -> Option<Decimal> { *self.slot(subject) }

  pub fn set(&mut self, subject: Subject, score: Option<Decimal>) {
    *self.slot_mut(subject) = score;
  }

  /// `(subject, score)` pairs in canonical order, absent scores included.
  pub fn iter(&self) -> impl Iterator<Item = (Subject, Option<Decimal>)> + '_ {
    Subject::ALL.into_iter().map(|s| (s, self.get(s)))
  }

  /// Every present score rounded with [`round_score`].
  pub fn rounded(&self) -> Self {
    let mut out = Self::default();
    for (subject, score) in self.iter() {
      out.set(subject, score.map(round_score));
    }
    out
  }

  /// Sum of the Group A scores, or `None` if any of the three is absent.
  pub fn group_a_total(&self) -> Option<Decimal> {
    Some(self.mathematics? + self.physics? + self.chemistry?)
  }

  fn slot(&self, subject: Subject) -> &Option<Decimal> {
    match subject {
      Subject::Mathematics => &self.mathematics,
      Subject::Literature => &self.literature,
      Subject::ForeignLanguage => &self.foreign_language,
      Subject::Physics => &self.physics,
      Subject::Chemistry => &self.chemistry,
      Subject::Biology => &self.biology,
      Subject::History => &self.history,
      Subject::Geography => &self.geography,
      Subject::Civics => &self.civics,
    }
  }

  fn slot_mut(&mut self, subject: Subject) -> &mut Option<Decimal> {
    match subject {
      Subject::Mathematics => &mut self.mathematics,
      Subject::Literature => &mut self.literature,
      Subject::ForeignLanguage => &mut self.foreign_language,
      Subject::Physics => &mut self.physics,
      Subject::Chemistry => &mut self.chemistry,
      Subject::Biology => &mut self.biology,
      Subject::History => &mut self.history,
      Subject::Geography => &mut self.geography,
      Subject::Civics => &mut self.civics,
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A parsed candidate row, ready to be upserted.
/// `created_at` is assigned by the store on first insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudentRecord {
  #[serde(rename = "sbd")]
  pub registration_number:      RegistrationNumber,
  #[serde(flatten)]
  pub scores:                   Scores,
  #[serde(rename = "ma_ngoai_ngu")]
  pub foreign_language_variant: Option<String>,
}

impl NewStudentRecord {
  pub fn new(registration_number: RegistrationNumber) -> Self {
    Self {
      registration_number,
      scores: Scores::default(),
      foreign_language_variant: None,
    }
  }

  /// Check the constraints of the persisted schema: key and variant lengths,
  /// and every present score within `0..=99.99`.
  pub fn validate(&self) -> Result<()> {
    if self.registration_number.as_str().chars().count() > REGISTRATION_NUMBER_MAX_LEN {
      return Err(Error::FieldTooLong {
        field: "sbd",
        max:   REGISTRATION_NUMBER_MAX_LEN,
      });
    }
    if let Some(v) = &self.foreign_language_variant
      && v.chars().count() > VARIANT_CODE_MAX_LEN
    {
      return Err(Error::FieldTooLong {
        field: "ma_ngoai_ngu",
        max:   VARIANT_CODE_MAX_LEN,
      });
    }
    for (subject, score) in self.scores.iter() {
      if let Some(value) = score
        && (value < Decimal::ZERO || value > SCORE_MAX)
      {
        return Err(Error::ScoreOutOfRange { subject, value });
      }
    }
    Ok(())
  }
}

/// A persisted candidate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
  #[serde(rename = "sbd")]
  pub registration_number:      RegistrationNumber,
  #[serde(flatten)]
  pub scores:                   Scores,
  #[serde(rename = "ma_ngoai_ngu")]
  pub foreign_language_variant: Option<String>,
  pub created_at:               DateTime<Utc>,
}

impl StudentRecord {
  /// Build the stored form of `input`, keeping `created_at` from an existing
  /// row if there is one.
  pub fn from_new(input: NewStudentRecord, created_at: DateTime<Utc>) -> Self {
    Self {
      registration_number: input.registration_number,
      scores: input.scores,
      foreign_language_variant: input.foreign_language_variant,
      created_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_accepts_exactly_eight_digits() {
    assert!(RegistrationNumber::parse_lookup("01000001").is_ok());
    assert!(RegistrationNumber::parse_lookup("1000001").is_err());
    assert!(RegistrationNumber::parse_lookup("010000011").is_err());
    assert!(RegistrationNumber::parse_lookup("0100000a").is_err());
    assert!(RegistrationNumber::parse_lookup("").is_err());
    // Non-ASCII digits are rejected even though they are numeric.
    assert!(RegistrationNumber::parse_lookup("０１０００００１").is_err());
  }

  #[test]
  fn empty_raw_registration_number_is_absent() {
    assert!(RegistrationNumber::from_raw("").is_none());
    assert_eq!(
      RegistrationNumber::from_raw(" 42 ").map(RegistrationNumber::into_inner),
      Some(" 42 ".to_owned())
    );
  }

  #[test]
  fn subject_index_matches_canonical_order() {
    for (i, s) in Subject::ALL.into_iter().enumerate() {
      assert_eq!(s.index(), i);
    }
  }

  #[test]
  fn group_a_total_requires_all_three() {
    let mut scores = Scores::default();
    scores.set(Subject::Mathematics, Some(Decimal::new(84, 1)));
    scores.set(Subject::Physics, Some(Decimal::new(6, 0)));
    assert_eq!(scores.group_a_total(), None);

    scores.set(Subject::Chemistry, Some(Decimal::ZERO));
    assert_eq!(scores.group_a_total(), Some(Decimal::new(144, 1)));
  }

  #[test]
  fn rounding_is_half_away_from_zero() {
    let d = |s: &str| s.parse::<Decimal>().unwrap();
    assert_eq!(round_score(d("7.995")), d("8.00"));
    assert_eq!(round_score(d("7.994")), d("7.99"));
    assert_eq!(round_score(d("5.125")), d("5.13"));
    assert_eq!(round_score(d("-0.001")), Decimal::ZERO);
    assert!(!round_score(d("-0.001")).is_sign_negative());

    let mut scores = Scores::default();
    scores.set(Subject::Physics, Some(d("6.005")));
    let rounded = scores.rounded();
    assert_eq!(rounded.physics, Some(d("6.01")));
    assert_eq!(rounded.chemistry, None);
  }

  #[test]
  fn validate_rejects_out_of_range_and_long_fields() {
    let sbd = RegistrationNumber::from_raw("01000001").unwrap();

    let mut rec = NewStudentRecord::new(sbd.clone());
    rec.scores.set(Subject::Biology, Some(Decimal::new(-1, 1)));
    assert!(matches!(
      rec.validate(),
      Err(Error::ScoreOutOfRange { subject: Subject::Biology, .. })
    ));

    let mut rec = NewStudentRecord::new(sbd.clone());
    rec.scores.set(Subject::Civics, Some(Decimal::new(10000, 2)));
    assert!(rec.validate().is_err());

    let mut rec = NewStudentRecord::new(sbd);
    rec.foreign_language_variant = Some("N1".into());
    rec.scores.set(Subject::Civics, Some(Decimal::ZERO));
    rec.scores.set(Subject::History, Some(SCORE_MAX));
    assert!(rec.validate().is_ok());

    let rec = NewStudentRecord::new(RegistrationNumber::from_raw("x".repeat(21)).unwrap());
    assert!(matches!(rec.validate(), Err(Error::FieldTooLong { field: "sbd", .. })));
  }

  #[test]
  fn serializes_absent_scores_as_null() {
    let mut rec = NewStudentRecord::new(RegistrationNumber::from_raw("01000002").unwrap());
    rec.scores.set(Subject::Physics, Some(Decimal::new(70, 1)));
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["sbd"], "01000002");
    assert!(json["toan"].is_null());
    assert_eq!(json["vat_li"], 7.0);
    assert!(json["ma_ngoai_ngu"].is_null());
  }
}
