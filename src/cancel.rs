//! Cooperative cancellation for blocking takes
//!
//! A [`CancelToken`] is a cloneable flag shared between the thread blocked
//! in a take and whichever thread decides to abandon the wait. Cancelling
//! never consumes an element: the blocked call returns
//! [`StackError::Cancelled`](crate::error::StackError::Cancelled) and the
//! stack is untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. Idempotent; all clones observe the change.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
        token.cancel(); // idempotent
        assert!(token.is_cancelled());
    }
}
