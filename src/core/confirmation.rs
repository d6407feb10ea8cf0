//! Two-step guard in front of destructive deletes.

use crate::core::services::LedgerService;
use crate::errors::LedgerError;
use crate::storage::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteState {
    #[default]
    Idle,
    /// Row at this position in the snapshot the request was made against.
    PendingConfirmation { index: usize },
}

/// Per-session confirm/cancel state machine. Never persisted: a restart
/// while pending simply abandons the request.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfirmationFlow {
    state: DeleteState,
}

impl DeleteConfirmationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DeleteState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    pub fn pending(&self) -> Option<usize> {
        match self.state {
            DeleteState::PendingConfirmation { index } => Some(index),
            DeleteState::Idle => None,
        }
    }

    /// Holds `index` until confirmed or cancelled. A new request replaces any
    /// pending one.
    pub fn request_delete(&mut self, index: usize) {
        tracing::debug!(index, "delete requested");
        self.state = DeleteState::PendingConfirmation { index };
    }

    /// Discards the pending index without touching the ledger.
    pub fn cancel(&mut self) -> Option<usize> {
        let index = self.pending();
        self.state = DeleteState::Idle;
        index
    }

    /// Returns to idle and deletes the held index, if any.
    ///
    /// `Ok(None)` when nothing was pending. The flow is idle afterwards even
    /// when the delete fails.
    pub fn confirm(&mut self, service: &mut LedgerService) -> Result<Option<Table>, LedgerError> {
        match self.cancel() {
            Some(index) => service.delete(index).map(Some),
            None => Ok(None),
        }
    }
}
