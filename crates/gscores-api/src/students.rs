//! Handlers for `/students` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students/:sbd` | 400 unless exactly 8 digits, 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use gscores_core::{
  record::{RegistrationNumber, Scores, StudentRecord},
  store::ScoreStore,
};
use serde::Serialize;

use crate::error::ApiError;

/// A candidate as returned by the lookup: key, nine scores and variant code.
/// Store bookkeeping such as `created_at` stays internal.
#[derive(Debug, Serialize)]
pub struct StudentResponse {
  #[serde(rename = "sbd")]
  pub registration_number:      RegistrationNumber,
  #[serde(flatten)]
  pub scores:                   Scores,
  #[serde(rename = "ma_ngoai_ngu")]
  pub foreign_language_variant: Option<String>,
}

impl From<StudentRecord> for StudentResponse {
  fn from(record: StudentRecord) -> Self {
    Self {
      registration_number:      record.registration_number,
      scores:                   record.scores,
      foreign_language_variant: record.foreign_language_variant,
    }
  }
}

/// `GET /students/:sbd`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(sbd): Path<String>,
) -> Result<Json<StudentResponse>, ApiError>
where
  S: ScoreStore,
{
  let key = RegistrationNumber::parse_lookup(&sbd)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let record = store
    .get(&key)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("Student with SBD {key} not found")))?;
  Ok(Json(record.into()))
}
