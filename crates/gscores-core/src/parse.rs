//! Score parser: one raw CSV row in, one [`NewStudentRecord`] out.
//!
//! Columns are matched by header name. Empty or unparseable score fields
//! become `None` (never zero), and an empty variant code becomes `None`.
//! Ranges are not checked here; that is the store's job.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
  Error, Result,
  record::{NewStudentRecord, RegistrationNumber, Scores},
};

/// One source row as read from the CSV, keyed by header name.
/// Columns missing from the header deserialize as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
  pub sbd:          Option<String>,
  pub toan:         Option<String>,
  pub ngu_van:      Option<String>,
  pub ngoai_ngu:    Option<String>,
  pub vat_li:       Option<String>,
  pub hoa_hoc:      Option<String>,
  pub sinh_hoc:     Option<String>,
  pub lich_su:      Option<String>,
  pub dia_li:       Option<String>,
  pub gdcd:         Option<String>,
  pub ma_ngoai_ngu: Option<String>,
}

/// Convert a raw row into a record candidate.
///
/// The only rejection is a missing registration number; the key is
/// otherwise passed through verbatim.
pub fn parse_row(row: RawRow) -> Result<NewStudentRecord> {
  let registration_number = row
    .sbd
    .and_then(RegistrationNumber::from_raw)
    .ok_or(Error::MissingRegistrationNumber)?;

  let scores = Scores {
    mathematics:      parse_score(row.toan.as_deref()),
    literature:       parse_score(row.ngu_van.as_deref()),
    foreign_language: parse_score(row.ngoai_ngu.as_deref()),
    physics:          parse_score(row.vat_li.as_deref()),
    chemistry:        parse_score(row.hoa_hoc.as_deref()),
    biology:          parse_score(row.sinh_hoc.as_deref()),
    history:          parse_score(row.lich_su.as_deref()),
    geography:        parse_score(row.dia_li.as_deref()),
    civics:           parse_score(row.gdcd.as_deref()),
  };

  Ok(NewStudentRecord {
    registration_number,
    scores,
    foreign_language_variant: row.ma_ngoai_ngu.filter(|v| !v.is_empty()),
  })
}

/// Parse one score field. Accepts plain decimals (`8.4`, `10`, `-1`) and
/// scientific notation (`1e1`); anything else is absent.
pub fn parse_score(raw: Option<&str>) -> Option<Decimal> {
  let s = raw?.trim();
  if !is_numeric_literal(s) {
    return None;
  }
  if s.contains(['e', 'E']) {
    Decimal::from_scientific(&s.replace('E', "e")).ok()
  } else {
    Decimal::from_str(s).ok()
  }
}

/// `[+-]? digits ('.' digits)? ([eE] [+-]? digits)?`
///
/// `Decimal::from_str` on its own also takes `_` separators, which must
/// not turn `8_5` into 85.
fn is_numeric_literal(s: &str) -> bool {
  fn digits(b: &[u8]) -> usize { b.iter().take_while(|c| c.is_ascii_digit()).count() }
  fn sign(b: &[u8]) -> usize { usize::from(matches!(b.first(), Some(b'+' | b'-'))) }

  let b = s.as_bytes();
  let mut i = sign(b);

  let int = digits(&b[i..]);
  if int == 0 {
    return false;
  }
  i += int;

  if b.get(i) == Some(&b'.') {
    let frac = digits(&b[i + 1..]);
    if frac == 0 {
      return false;
    }
    i += 1 + frac;
  }

  if matches!(b.get(i), Some(b'e' | b'E')) {
    i += 1;
    i += sign(&b[i..]);
    let exp = digits(&b[i..]);
    if exp == 0 {
      return false;
    }
    i += exp;
  }

  i == b.len()
}
