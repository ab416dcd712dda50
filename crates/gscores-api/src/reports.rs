//! Handlers for `/reports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reports/subject-distribution` | Band counts keyed by subject |
//! | `GET`  | `/reports/top10-groupA` | `{"students": [...]}`, best first |

use std::sync::Arc;

use axum::{Json, extract::State};
use gscores_core::{
  report::{GROUP_A_LIMIT, GroupAEntry, SubjectDistribution},
  store::ScoreStore,
};
use serde::Serialize;

use crate::error::ApiError;

// ─── Subject distribution ────────────────────────────────────────────────────

/// `GET /reports/subject-distribution`
pub async fn subject_distribution<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<SubjectDistribution>, ApiError>
where
  S: ScoreStore,
{
  let dist = store.subject_distribution().await.map_err(ApiError::store)?;
  Ok(Json(dist))
}

// ─── Group A ranking ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GroupARanking {
  pub students: Vec<GroupAEntry>,
}

/// `GET /reports/top10-groupA`
pub async fn top_group_a<S>(State(store): State<Arc<S>>) -> Result<Json<GroupARanking>, ApiError>
where
  S: ScoreStore,
{
  let students = store
    .top_group_a(GROUP_A_LIMIT)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(GroupARanking { students }))
}
