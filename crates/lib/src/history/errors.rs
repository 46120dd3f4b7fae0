//! Error types for the undo history.

use thiserror::Error;

/// Errors raised by the [`UndoRecorder`](super::UndoRecorder).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Replaying an operation through the node graph failed
    #[error("Failed to replay history operation: {source}")]
    ApplyFailed {
        #[source]
        source: Box<crate::Error>,
    },

    /// `end_transaction` was called without a matching `begin_transaction`
    #[error("No history transaction is open")]
    TransactionNotOpen,
}

impl HistoryError {
    /// Check if this error wraps a failed replay
    pub fn is_apply_failed(&self) -> bool {
        matches!(self, HistoryError::ApplyFailed { .. })
    }
}

impl From<HistoryError> for crate::Error {
    fn from(err: HistoryError) -> Self {
        crate::Error::History(err)
    }
}
