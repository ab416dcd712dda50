//! Batch loader: one-shot CSV → [`ScoreStore`] ingestion.
//!
//! A run reads and parses the whole source first, then writes the parsed
//! records in fixed-size batches. Batches run one after another; inside a
//! batch, distinct registration numbers are written concurrently while
//! repeated ones are written in source order, so the last row wins.
//!
//! [`ScoreStore`]: gscores_core::store::ScoreStore

pub mod config;
pub mod error;
pub mod loader;
pub mod phase;
pub mod report;
pub mod source;

pub use config::{FailurePolicy, IngestConfig, LoaderConfig};
pub use error::LoadError;
pub use loader::{BatchLoader, CancelHandle};
pub use phase::LoadPhase;
pub use report::LoadReport;
