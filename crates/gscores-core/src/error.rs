//! Error types for `gscores-core`.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::record::Subject;

#[derive(Debug, Error)]
pub enum Error {
  #[error("SBD must be exactly 8 digits")]
  InvalidRegistrationNumber(String),

  #[error("row has no registration number")]
  MissingRegistrationNumber,

  #[error("{subject} score {value} is outside 0..=99.99")]
  ScoreOutOfRange { subject: Subject, value: Decimal },

  #[error("{field} is longer than {max} characters")]
  FieldTooLong { field: &'static str, max: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
