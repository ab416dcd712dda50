//! JSON query API for G-Scores.
//!
//! Exposes an axum [`Router`] backed by any [`ScoreStore`]. The API is
//! read-only; records only enter the store through the batch loader.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gscores_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod reports;
pub mod students;

use std::sync::Arc;

use axum::{Router, routing::get};
use gscores_core::store::ScoreStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ScoreStore + 'static,
{
  Router::new()
    .route("/students/{sbd}", get(students::get_one::<S>))
    .route("/reports/subject-distribution", get(reports::subject_distribution::<S>))
    .route("/reports/top10-groupA", get(reports::top_group_a::<S>))
    .with_state(store)
}
