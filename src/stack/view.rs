//! Decoupled perspective handles
//!
//! A [`View`] lets a caller observe a [`Stack`] under its own access
//! discipline, independent of the stack's current perspective. Several
//! views with distinct perspectives may attach to the same stack
//! concurrently; the canonical use is work stealing, where one LIFO view
//! (the owner) and one FIFO view (the thieves) share one slot sequence.
//!
//! A view owns no payload storage and no locks: every operation acquires
//! the target stack's lock for its duration, so mutations through any
//! view are visible to every other view immediately.

use crate::cancel::CancelToken;
use crate::error::{RuntimeResult, StackError};
use crate::stack::slots::Selector;
use crate::stack::{Perspective, Stack};
use std::sync::Arc;

/// Perspective handle onto a shared [`Stack`]
#[derive(Clone)]
pub struct View {
    target: Arc<Stack>,
    perspective: Perspective,
}

impl View {
    /// Attach a view with the given perspective.
    pub fn new(target: Arc<Stack>, perspective: Perspective) -> Self {
        Self {
            target,
            perspective,
        }
    }

    /// LIFO view.
    pub fn lifo(target: Arc<Stack>) -> Self {
        Self::new(target, Perspective::Lifo)
    }

    /// FIFO view.
    pub fn fifo(target: Arc<Stack>) -> Self {
        Self::new(target, Perspective::Fifo)
    }

    /// Indexed view.
    pub fn indexed(target: Arc<Stack>) -> Self {
        Self::new(target, Perspective::Indexed)
    }

    /// Hash view.
    pub fn hash(target: Arc<Stack>) -> Self {
        Self::new(target, Perspective::Hash)
    }

    /// This view's perspective.
    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    /// The stack this view observes.
    pub fn target(&self) -> &Arc<Stack> {
        &self.target
    }

    /// Push through the view. Fails with `MissingKey` when either the
    /// view's or the target's discipline requires a key.
    pub fn push(&self, payload: Vec<u8>) -> RuntimeResult<()> {
        if !self.target.kind().accepts(&payload) {
            return Err(StackError::TypeMismatch {
                expected: self.target.kind(),
            });
        }
        self.target.core.push(payload, None, Some(self.perspective))
    }

    /// Keyed push through the view.
    pub fn push_keyed(&self, key: &str, payload: Vec<u8>) -> RuntimeResult<()> {
        if !self.target.kind().accepts(&payload) {
            return Err(StackError::TypeMismatch {
                expected: self.target.kind(),
            });
        }
        self.target
            .core
            .push(payload, Some(key), Some(self.perspective))
    }

    /// Remove the element this view's perspective selects.
    pub fn pop(&self) -> RuntimeResult<Vec<u8>> {
        self.target.core.pop(Selector::Default, Some(self.perspective))
    }

    /// Remove the slot with this key.
    pub fn pop_keyed(&self, key: &str) -> RuntimeResult<Vec<u8>> {
        self.target.core.pop(Selector::Key(key), Some(self.perspective))
    }

    /// Non-destructive [`pop`](Self::pop).
    pub fn peek(&self) -> RuntimeResult<Vec<u8>> {
        self.target.core.peek(Selector::Default, Some(self.perspective))
    }

    /// Peek at the n-th element in this view's order.
    pub fn peek_at(&self, offset: usize) -> RuntimeResult<Vec<u8>> {
        self.target
            .core
            .peek(Selector::Offset(offset), Some(self.perspective))
    }

    /// Blocking pop under this view's perspective.
    pub fn take(&self, timeout_ms: u64) -> RuntimeResult<Vec<u8>> {
        self.target.core.take(timeout_ms, None, Some(self.perspective))
    }

    /// [`take`](Self::take) observing a cancellation token.
    pub fn take_cancellable(&self, token: &CancelToken, timeout_ms: u64) -> RuntimeResult<Vec<u8>> {
        self.target
            .core
            .take(timeout_ms, Some(token), Some(self.perspective))
    }

    /// Live slots in the target.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Whether the target has no live slots.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}
