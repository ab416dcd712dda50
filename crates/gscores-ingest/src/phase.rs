//! Run phases and the transitions allowed between them.
//!
//! ```text
//! NotStarted → Reading → Writing(1 of n) → … → Writing(n of n) → Verifying → Done
//!                   └──────────(no records)──────────────────────┘
//! any non-terminal phase → Failed
//! ```

use tokio::sync::watch;

use crate::error::LoadError;

/// Where an ingestion run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
  NotStarted,
  Reading,
  /// Writing batch `batch` (1-based) of `of`.
  Writing { batch: usize, of: usize },
  Verifying,
  Done,
  Failed,
}

impl LoadPhase {
  pub fn is_terminal(self) -> bool { matches!(self, Self::Done | Self::Failed) }

  /// Whether a run may move from `self` to `next`.
  pub fn can_advance_to(self, next: LoadPhase) -> bool {
    use LoadPhase::*;
    match (self, next) {
      (from, Failed) => !from.is_terminal(),
      (NotStarted, Reading) => true,
      (Reading, Writing { batch: 1, of }) => of >= 1,
      (Reading, Verifying) => true,
      (Writing { batch, of }, Writing { batch: to, of: to_of }) => {
        of == to_of && to == batch + 1 && to <= of
      }
      (Writing { batch, of }, Verifying) => batch == of,
      (Verifying, Done) => true,
      _ => false,
    }
  }
}

/// Holds the phase of the current run and publishes every change to
/// subscribers.
#[derive(Debug)]
pub struct PhaseTracker {
  tx: watch::Sender<LoadPhase>,
}

impl Default for PhaseTracker {
  fn default() -> Self { Self::new() }
}

impl PhaseTracker {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(LoadPhase::NotStarted);
    Self { tx }
  }

  pub fn current(&self) -> LoadPhase { *self.tx.borrow() }

  pub fn subscribe(&self) -> watch::Receiver<LoadPhase> { self.tx.subscribe() }

  /// Start a fresh run.
  pub fn reset(&self) { self.tx.send_replace(LoadPhase::NotStarted); }

  pub fn advance(&self, next: LoadPhase) -> Result<(), LoadError> {
    let from = self.current();
    if !from.can_advance_to(next) {
      return Err(LoadError::InvalidTransition { from, to: next });
    }
    tracing::debug!(?from, to = ?next, "load phase");
    self.tx.send_replace(next);
    Ok(())
  }

  /// Move to [`LoadPhase::Failed`] unless the run already ended.
  pub fn fail(&self) {
    let from = self.current();
    if !from.is_terminal() {
      tracing::debug!(?from, "load phase -> Failed");
      self.tx.send_replace(LoadPhase::Failed);
    }
  }
}
