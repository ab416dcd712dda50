//! Error type for `gscores-store-sqlite`.

use gscores_core::record::Subject;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] gscores_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A score too large to be stored as hundredths.
  #[error("{subject} score {value} does not fit the score column")]
  ScoreOverflow { subject: Subject, value: Decimal },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
