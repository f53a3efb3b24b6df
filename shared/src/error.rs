//! Core error taxonomy
//!
//! Every fallible operation in the engine returns [`CoreError`]. Errors are
//! always propagated to the immediate caller; nothing is retried inside the
//! core except the bounded retry loop of the counter-based sequence
//! allocator.

use thiserror::Error;

/// Domain errors surfaced to terminal action handlers
#[derive(Debug, Error)]
pub enum CoreError {
    /// A write targeted a stale revision. Recoverable: reload and retry
    /// (one immediate retry recommended), or surface to the user.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// The operation is illegal for the current order/item/request state.
    /// Never retried.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The counter allocator exhausted its retry budget.
    #[error("Sequence allocation exhausted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    /// Rejected before any write was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document store adapter fault.
    #[error("Store error: {0}")]
    Store(String),
}

impl CoreError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        CoreError::InvalidState(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    /// Whether a caller-side reload-and-retry can succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, CoreError::ConcurrentModification(_))
    }
}

/// Result type for engine operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retriable() {
        assert!(CoreError::ConcurrentModification("order:1".into()).is_retriable());
        assert!(!CoreError::invalid_state("already cancelled").is_retriable());
        assert!(!CoreError::AllocationExhausted { attempts: 5 }.is_retriable());
        assert!(!CoreError::validation("reason must not be empty").is_retriable());
    }
}
