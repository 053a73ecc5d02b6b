//! Specialised int64 stack
//!
//! Integer arithmetic is the hottest path in compiled Strata programs,
//! and the byte-encoding round trip of the generic [`Stack`](crate::stack::Stack)
//! is measurable overhead there. [`Int64Stack`] is a structural mirror of
//! the generic stack holding native `i64` payloads: same perspectives,
//! capacity policy, freeze/close lifecycle, and blocking take, with no
//! encode/decode on the way in or out.

use crate::cancel::CancelToken;
use crate::error::RuntimeResult;
use crate::stack::slots::{CompactionPolicy, Selector, SyncStack};
use crate::stack::Perspective;
use std::sync::Arc;

/// Thread-safe stack over native `i64` payloads
pub struct Int64Stack {
    core: SyncStack<i64>,
}

impl Int64Stack {
    /// Create an unbounded int64 stack.
    pub fn new(perspective: Perspective) -> Self {
        Self {
            core: SyncStack::new(perspective, None, CompactionPolicy::default()),
        }
    }

    /// Create an int64 stack with a strict capacity limit.
    pub fn with_capacity(perspective: Perspective, capacity: usize) -> Self {
        Self {
            core: SyncStack::new(perspective, Some(capacity), CompactionPolicy::default()),
        }
    }

    /// Push a keyless value.
    pub fn push(&self, value: i64) -> RuntimeResult<()> {
        self.core.push(value, None, None)
    }

    /// Push with a key (indexed under the Hash perspective).
    pub fn push_keyed(&self, key: &str, value: i64) -> RuntimeResult<()> {
        self.core.push(value, Some(key), None)
    }

    /// Remove and return the element the current perspective selects.
    pub fn pop(&self) -> RuntimeResult<i64> {
        self.core.pop(Selector::Default, None)
    }

    /// Remove and return the slot with this key.
    pub fn pop_keyed(&self, key: &str) -> RuntimeResult<i64> {
        self.core.pop(Selector::Key(key), None)
    }

    /// Non-destructive [`pop`](Self::pop).
    pub fn peek(&self) -> RuntimeResult<i64> {
        self.core.peek(Selector::Default, None)
    }

    /// Peek at the n-th element in the current perspective's order.
    pub fn peek_at(&self, offset: usize) -> RuntimeResult<i64> {
        self.core.peek(Selector::Offset(offset), None)
    }

    /// Upsert by key.
    pub fn set(&self, key: &str, value: i64) -> RuntimeResult<()> {
        self.core.set(key, value)
    }

    /// Value of the live slot carrying this key.
    pub fn get(&self, key: &str) -> RuntimeResult<i64> {
        self.core.get(key)
    }

    /// Positional read over live slots, oldest first.
    pub fn get_at(&self, index: usize) -> RuntimeResult<i64> {
        self.core.get_at(index)
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Whether no live slots remain.
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// The capacity limit, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.core.capacity()
    }

    /// Whether a capacity limit is set and reached.
    pub fn is_full(&self) -> bool {
        self.core.is_full()
    }

    /// The current perspective.
    pub fn perspective(&self) -> Perspective {
        self.core.perspective()
    }

    /// Switch the perspective governing direct calls.
    pub fn set_perspective(&self, perspective: Perspective) -> RuntimeResult<()> {
        self.core.set_perspective(perspective)
    }

    /// Forbid mutation while permitting reads. One-way.
    pub fn freeze(&self) {
        self.core.freeze();
    }

    /// Whether the stack is frozen.
    pub fn is_frozen(&self) -> bool {
        self.core.is_frozen()
    }

    /// Reject further pushes; pops drain the remainder. One-way.
    pub fn close(&self) {
        self.core.close();
    }

    /// Whether the stack is closed.
    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    /// Remove every live slot.
    pub fn clear(&self) -> RuntimeResult<()> {
        self.core.clear()
    }

    /// Blocking pop; `timeout_ms` of zero waits indefinitely.
    pub fn take(&self, timeout_ms: u64) -> RuntimeResult<i64> {
        self.core.take(timeout_ms, None, None)
    }

    /// Blocking pop observing a cancellation token.
    pub fn take_cancellable(&self, token: &CancelToken, timeout_ms: u64) -> RuntimeResult<i64> {
        self.core.take(timeout_ms, Some(token), None)
    }
}

/// Perspective handle onto a shared [`Int64Stack`]
#[derive(Clone)]
pub struct Int64View {
    target: Arc<Int64Stack>,
    perspective: Perspective,
}

impl Int64View {
    /// Attach a view with the given perspective.
    pub fn new(target: Arc<Int64Stack>, perspective: Perspective) -> Self {
        Self {
            target,
            perspective,
        }
    }

    /// LIFO view.
    pub fn lifo(target: Arc<Int64Stack>) -> Self {
        Self::new(target, Perspective::Lifo)
    }

    /// FIFO view.
    pub fn fifo(target: Arc<Int64Stack>) -> Self {
        Self::new(target, Perspective::Fifo)
    }

    /// This view's perspective.
    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    /// Push through the view.
    pub fn push(&self, value: i64) -> RuntimeResult<()> {
        self.target.core.push(value, None, Some(self.perspective))
    }

    /// Remove the element this view's perspective selects.
    pub fn pop(&self) -> RuntimeResult<i64> {
        self.target.core.pop(Selector::Default, Some(self.perspective))
    }

    /// Non-destructive [`pop`](Self::pop).
    pub fn peek(&self) -> RuntimeResult<i64> {
        self.target.core.peek(Selector::Default, Some(self.perspective))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackError;

    #[test]
    fn test_no_encoding_round_trip() {
        let s = Int64Stack::new(Perspective::Lifo);
        s.push(i64::MIN).unwrap();
        s.push(i64::MAX).unwrap();
        assert_eq!(s.pop().unwrap(), i64::MAX);
        assert_eq!(s.pop().unwrap(), i64::MIN);
    }

    #[test]
    fn test_capped() {
        let s = Int64Stack::with_capacity(Perspective::Fifo, 2);
        s.push(1).unwrap();
        s.push(2).unwrap();
        assert_eq!(s.push(3), Err(StackError::Full));
        assert_eq!(s.pop().unwrap(), 1);
        s.push(3).unwrap();
        assert_eq!(s.pop().unwrap(), 2);
        assert_eq!(s.pop().unwrap(), 3);
    }

    #[test]
    fn test_indexed_perspective() {
        let s = Int64Stack::new(Perspective::Indexed);
        for v in [5, 6, 7] {
            s.push(v).unwrap();
        }
        assert_eq!(s.get_at(1).unwrap(), 6);
        assert_eq!(s.peek_at(2).unwrap(), 7);
        assert_eq!(s.pop().unwrap(), 5);
        assert_eq!(s.peek().unwrap(), 6);
    }

    #[test]
    fn test_views_for_work_splitting() {
        let stack = Arc::new(Int64Stack::new(Perspective::Lifo));
        let owner = Int64View::lifo(Arc::clone(&stack));
        let thief = Int64View::fifo(Arc::clone(&stack));
        for v in 1..=4 {
            owner.push(v).unwrap();
        }
        assert_eq!(owner.pop().unwrap(), 4);
        assert_eq!(thief.pop().unwrap(), 1);
        assert_eq!(owner.pop().unwrap(), 3);
        assert_eq!(thief.pop().unwrap(), 2);
    }

    #[test]
    fn test_take_blocks_until_push() {
        let s = Arc::new(Int64Stack::new(Perspective::Fifo));
        let producer = {
            let s = Arc::clone(&s);
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(15));
                s.push(99).unwrap();
            })
        };
        assert_eq!(s.take(2_000).unwrap(), 99);
        producer.join().unwrap();
    }
}
