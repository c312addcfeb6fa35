//! # Transaction Batching
//!
//! Large imports against a transactional store must not accumulate one
//! unbounded transaction. The batcher counts mutations and closes the open
//! window with a success outcome every time the counter exceeds the
//! configured window size, immediately opening the next window.
//!
//! Two states:
//! - **Open** — the store is transactional; it was forced into manual
//!   commit mode (its prior mode is remembered for restoration) and a
//!   window is in progress.
//! - **Closed** — the store has no transactional capability; every call is
//!   a no-op.
//!
//! There is no rollback path here. A failure mid-parse propagates out with
//! the current window uncommitted; windows already committed stay committed.

use crate::graph::PropertyGraph;
use crate::types::{StoreError, TransactionMode, TransactionOutcome};

/// Batching state, tagged by whether the store is transactional.
#[derive(Debug)]
enum BatchState {
    /// Non-transactional store; no windows are managed.
    Closed,
    /// Manual-mode windows in progress; `prior_mode` is restored at finish.
    Open { prior_mode: TransactionMode },
}

/// The bounded commit window machine.
#[derive(Debug)]
pub(super) struct TransactionBatcher {
    /// Mutations allowed per window before a commit is forced.
    window: usize,
    /// Mutations recorded since the last commit.
    pending: usize,
    state: BatchState,
}

impl TransactionBatcher {
    /// Probe the store's transactional capability and, if present, force
    /// manual commit mode and open the first window.
    pub(super) fn open<G: PropertyGraph>(
        graph: &mut G,
        window: usize,
    ) -> Result<Self, StoreError> {
        let state = match graph.transactions() {
            Some(tx) => {
                let prior_mode = tx.transaction_mode();
                tx.set_transaction_mode(TransactionMode::Manual)?;
                tx.begin()?;
                BatchState::Open { prior_mode }
            }
            None => BatchState::Closed,
        };
        Ok(Self {
            window,
            pending: 0,
            state,
        })
    }

    /// Record one mutation (vertex created, edge created, or property set).
    pub(super) fn record(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Close the window if the counter has exceeded the window size.
    ///
    /// Called once per consumed event; a single event may have recorded
    /// several mutations (an edge can create both endpoints).
    pub(super) fn checkpoint<G: PropertyGraph>(&mut self, graph: &mut G) -> Result<(), StoreError> {
        if matches!(self.state, BatchState::Closed) || self.pending <= self.window {
            return Ok(());
        }
        if let Some(tx) = graph.transactions() {
            tx.commit(TransactionOutcome::Success)?;
            tx.begin()?;
        }
        self.pending = 0;
        Ok(())
    }

    /// Commit the final window and restore the store's prior commit mode.
    pub(super) fn finish<G: PropertyGraph>(self, graph: &mut G) -> Result<(), StoreError> {
        if let BatchState::Open { prior_mode } = self.state
            && let Some(tx) = graph.transactions()
        {
            tx.commit(TransactionOutcome::Success)?;
            tx.set_transaction_mode(prior_mode)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
