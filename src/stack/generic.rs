//! Generic byte-payload stack
//!
//! [`Stack`] is the workhorse container compiled Strata programs target.
//! Payloads are canonical byte encodings (see [`crate::encoding`]) tagged
//! by the stack's declared element kind; the kind is fixed at creation and
//! cross-kind conversion happens only in [`bring`](Stack::bring).
//!
//! The stack is thread-safe: a single mutex protects the slot sequence,
//! hash index, cursors, and flag bits, and a condvar wakes blocking
//! takers. Operations are linearisable under that lock.

use crate::cancel::CancelToken;
use crate::encoding::ElementKind;
use crate::error::{RuntimeResult, StackError};
use crate::stack::slots::{CompactionPolicy, Selector, SyncStack};
use crate::stack::Perspective;

/// Thread-safe typed stack with a switchable perspective
pub struct Stack {
    kind: ElementKind,
    pub(crate) core: SyncStack<Vec<u8>>,
}

impl Stack {
    /// Create an unbounded stack.
    pub fn new(perspective: Perspective, kind: ElementKind) -> Self {
        Self {
            kind,
            core: SyncStack::new(perspective, None, CompactionPolicy::default()),
        }
    }

    /// Create a stack with a strict capacity limit.
    pub fn with_capacity(perspective: Perspective, kind: ElementKind, capacity: usize) -> Self {
        Self {
            kind,
            core: SyncStack::new(perspective, Some(capacity), CompactionPolicy::default()),
        }
    }

    /// Create an unbounded stack with explicit compaction tuning.
    pub fn with_policy(
        perspective: Perspective,
        kind: ElementKind,
        policy: CompactionPolicy,
    ) -> Self {
        Self {
            kind,
            core: SyncStack::new(perspective, None, policy),
        }
    }

    /// The element kind declared at creation.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    fn check_payload(&self, payload: &[u8]) -> RuntimeResult<()> {
        if self.kind.accepts(payload) {
            Ok(())
        } else {
            Err(StackError::TypeMismatch {
                expected: self.kind,
            })
        }
    }

    /// Push a keyless payload. Fails with `MissingKey` under the Hash
    /// perspective, `Full` at capacity, `Frozen`/`Closed` after those
    /// transitions, and `TypeMismatch` when the payload is not a valid
    /// encoding of the stack's kind.
    pub fn push(&self, payload: Vec<u8>) -> RuntimeResult<()> {
        self.check_payload(&payload)?;
        self.core.push(payload, None, None)
    }

    /// Push with a key. Under Hash the key is indexed, and re-pushing a
    /// live key replaces its payload and moves the slot to the end of
    /// insertion order; under other perspectives the key is ignored.
    pub fn push_keyed(&self, key: &str, payload: Vec<u8>) -> RuntimeResult<()> {
        self.check_payload(&payload)?;
        self.core.push(payload, Some(key), None)
    }

    /// Remove and return the element selected by the current perspective.
    pub fn pop(&self) -> RuntimeResult<Vec<u8>> {
        self.core.pop(Selector::Default, None)
    }

    /// Remove and return the slot with this key.
    pub fn pop_keyed(&self, key: &str) -> RuntimeResult<Vec<u8>> {
        self.core.pop(Selector::Key(key), None)
    }

    /// Non-destructive [`pop`](Self::pop).
    pub fn peek(&self) -> RuntimeResult<Vec<u8>> {
        self.core.peek(Selector::Default, None)
    }

    /// Non-destructive [`pop_keyed`](Self::pop_keyed).
    pub fn peek_keyed(&self, key: &str) -> RuntimeResult<Vec<u8>> {
        self.core.peek(Selector::Key(key), None)
    }

    /// Peek at the n-th element in the current perspective's order
    /// (LIFO counts from the top, everything else from the front).
    pub fn peek_at(&self, offset: usize) -> RuntimeResult<Vec<u8>> {
        self.core.peek(Selector::Offset(offset), None)
    }

    /// Upsert by key: replaces the payload in place when the key is live,
    /// inserts a new keyed slot otherwise.
    pub fn set(&self, key: &str, payload: Vec<u8>) -> RuntimeResult<()> {
        self.check_payload(&payload)?;
        self.core.set(key, payload)
    }

    /// Payload of the live slot carrying this key.
    pub fn get(&self, key: &str) -> RuntimeResult<Vec<u8>> {
        self.core.get(key)
    }

    /// Positional read over live slots, oldest first.
    pub fn get_at(&self, index: usize) -> RuntimeResult<Vec<u8>> {
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

    /// The capacity limit, if one was set at creation.
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

    /// Switch the perspective governing direct calls on this stack.
    /// In-flight blocking takers are unaffected; the next call observes
    /// the new ordering.
    pub fn set_perspective(&self, perspective: Perspective) -> RuntimeResult<()> {
        self.core.set_perspective(perspective)
    }

    /// Forbid mutation while permitting reads. One-way and idempotent;
    /// pending blocking takers unblock with `Frozen`.
    pub fn freeze(&self) {
        self.core.freeze();
    }

    /// Whether the stack is frozen.
    pub fn is_frozen(&self) -> bool {
        self.core.is_frozen()
    }

    /// Reject further pushes and let pops drain the remaining elements.
    /// One-way and idempotent; pending blocking takers unblock with
    /// `Closed`.
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

    /// Blocking pop. Suspends until an element is available, the deadline
    /// elapses, or the stack is closed; `timeout_ms` of zero waits
    /// indefinitely. Returns `Timeout` on deadline and `Closed` once the
    /// stack is closed and drained.
    pub fn take(&self, timeout_ms: u64) -> RuntimeResult<Vec<u8>> {
        self.core.take(timeout_ms, None, None)
    }

    /// [`take`](Self::take) that additionally observes a cancellation
    /// token, returning `Cancelled` without consuming an element.
    pub fn take_cancellable(&self, token: &CancelToken, timeout_ms: u64) -> RuntimeResult<Vec<u8>> {
        self.core.take(timeout_ms, Some(token), None)
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("kind", &self.kind)
            .field("perspective", &self.perspective())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("frozen", &self.is_frozen())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_int64, encode_int64};

    #[test]
    fn test_push_pop_returns_exact_bytes() {
        let s = Stack::new(Perspective::Lifo, ElementKind::Bytes);
        s.push(vec![1, 2, 3]).unwrap();
        assert_eq!(s.pop().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_kind_validation() {
        let s = Stack::new(Perspective::Lifo, ElementKind::Int64);
        assert_eq!(
            s.push(vec![1, 2, 3]),
            Err(StackError::TypeMismatch {
                expected: ElementKind::Int64
            })
        );
        s.push(encode_int64(42)).unwrap();
        assert_eq!(decode_int64(&s.pop().unwrap()), 42);
    }

    #[test]
    fn test_capped_constructor() {
        let s = Stack::with_capacity(Perspective::Lifo, ElementKind::Int64, 3);
        for v in [1, 2, 3] {
            s.push(encode_int64(v)).unwrap();
        }
        assert_eq!(s.push(encode_int64(4)), Err(StackError::Full));
        assert_eq!(s.len(), 3);
        // Existing elements unchanged and recoverable in LIFO order.
        for want in [3, 2, 1] {
            assert_eq!(decode_int64(&s.pop().unwrap()), want);
        }
    }

    #[test]
    fn test_hash_stack_end_to_end() {
        let s = Stack::new(Perspective::Hash, ElementKind::Str);
        s.push_keyed("greeting", b"hello".to_vec()).unwrap();
        s.push_keyed("name", b"strata".to_vec()).unwrap();
        assert_eq!(s.get("greeting").unwrap(), b"hello".to_vec());
        assert_eq!(s.pop_keyed("name").unwrap(), b"strata".to_vec());
        assert_eq!(
            s.pop_keyed("name"),
            Err(StackError::KeyNotFound { key: "name".into() })
        );
        // Pop without a key removes the newest live slot.
        assert_eq!(s.pop().unwrap(), b"hello".to_vec());
    }

    #[test]
    fn test_set_then_fifo_pop_yields_value() {
        let s = Stack::new(Perspective::Hash, ElementKind::Int64);
        s.set("k", encode_int64(9)).unwrap();
        s.set_perspective(Perspective::Fifo).unwrap();
        assert_eq!(decode_int64(&s.pop().unwrap()), 9);
    }

    #[test]
    fn test_indexed_perspective_positional_access() {
        let s = Stack::new(Perspective::Indexed, ElementKind::Int64);
        for v in [10, 20, 30] {
            s.push(encode_int64(v)).unwrap();
        }
        assert_eq!(decode_int64(&s.peek_at(0).unwrap()), 10);
        assert_eq!(decode_int64(&s.get_at(2).unwrap()), 30);
        assert_eq!(
            s.peek_at(3),
            Err(StackError::IndexOutOfRange { index: 3, len: 3 })
        );
        // Pop takes the numerically lowest live index, not the newest slot.
        assert_eq!(decode_int64(&s.pop().unwrap()), 10);
        // The same offset reads from the top once the stack is LIFO.
        s.set_perspective(Perspective::Lifo).unwrap();
        assert_eq!(decode_int64(&s.peek_at(0).unwrap()), 30);
        assert_eq!(decode_int64(&s.pop().unwrap()), 30);
        assert_eq!(decode_int64(&s.pop().unwrap()), 20);
    }

    #[test]
    fn test_aggressive_compaction_keeps_semantics() {
        let s = Stack::with_policy(
            Perspective::Hash,
            ElementKind::Int64,
            CompactionPolicy { min_dead: 1 },
        );
        for round in 0..100i64 {
            s.push_keyed("hot", encode_int64(round)).unwrap();
            assert_eq!(s.len(), 1);
        }
        assert_eq!(decode_int64(&s.get("hot").unwrap()), 99);
    }

    #[test]
    fn test_set_perspective_idempotent() {
        let s = Stack::new(Perspective::Lifo, ElementKind::Int64);
        for v in [1, 2] {
            s.push(encode_int64(v)).unwrap();
        }
        s.set_perspective(Perspective::Fifo).unwrap();
        s.set_perspective(Perspective::Fifo).unwrap();
        assert_eq!(decode_int64(&s.pop().unwrap()), 1);
    }
}
