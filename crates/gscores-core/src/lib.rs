//! Core types and trait definitions for the G-Scores exam-score store.
//!
//! This crate has no HTTP or database dependencies. The
//! loader, the SQLite backend and the API all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod memory;
pub mod parse;
pub mod path;
pub mod record;
pub mod report;
pub mod signal;
pub mod store;

pub use error::{Error, Result};
