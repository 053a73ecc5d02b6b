//! Stack specialised to the dynamic value union
//!
//! The interpreter works in [`Value`]s rather than byte encodings; a
//! [`ValueStack`] stores them natively so dynamic code pays no
//! encode/decode on every operation. This is also the only stack flavour
//! that can carry the in-memory-only variants (`Codeblock`, `Array`).

use crate::cancel::CancelToken;
use crate::encoding::value::Value;
use crate::error::RuntimeResult;
use crate::stack::slots::{CompactionPolicy, Selector, SyncStack};
use crate::stack::Perspective;

/// Thread-safe stack over dynamic [`Value`]s
pub struct ValueStack {
    core: SyncStack<Value>,
}

impl ValueStack {
    /// Create an unbounded value stack.
    pub fn new(perspective: Perspective) -> Self {
        Self {
            core: SyncStack::new(perspective, None, CompactionPolicy::default()),
        }
    }

    /// Create a value stack with a strict capacity limit.
    pub fn with_capacity(perspective: Perspective, capacity: usize) -> Self {
        Self {
            core: SyncStack::new(perspective, Some(capacity), CompactionPolicy::default()),
        }
    }

    /// Push a keyless value.
    pub fn push(&self, value: Value) -> RuntimeResult<()> {
        self.core.push(value, None, None)
    }

    /// Push with a key (indexed under the Hash perspective).
    pub fn push_keyed(&self, key: &str, value: Value) -> RuntimeResult<()> {
        self.core.push(value, Some(key), None)
    }

    /// Remove and return the element the current perspective selects.
    pub fn pop(&self) -> RuntimeResult<Value> {
        self.core.pop(Selector::Default, None)
    }

    /// Remove and return the slot with this key.
    pub fn pop_keyed(&self, key: &str) -> RuntimeResult<Value> {
        self.core.pop(Selector::Key(key), None)
    }

    /// Non-destructive [`pop`](Self::pop).
    pub fn peek(&self) -> RuntimeResult<Value> {
        self.core.peek(Selector::Default, None)
    }

    /// Peek at the n-th element in the current perspective's order.
    pub fn peek_at(&self, offset: usize) -> RuntimeResult<Value> {
        self.core.peek(Selector::Offset(offset), None)
    }

    /// Upsert by key.
    pub fn set(&self, key: &str, value: Value) -> RuntimeResult<()> {
        self.core.set(key, value)
    }

    /// Value of the live slot carrying this key.
    pub fn get(&self, key: &str) -> RuntimeResult<Value> {
        self.core.get(key)
    }

    /// Positional read over live slots, oldest first.
    pub fn get_at(&self, index: usize) -> RuntimeResult<Value> {
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
    pub fn take(&self, timeout_ms: u64) -> RuntimeResult<Value> {
        self.core.take(timeout_ms, None, None)
    }

    /// Blocking pop observing a cancellation token.
    pub fn take_cancellable(&self, token: &CancelToken, timeout_ms: u64) -> RuntimeResult<Value> {
        self.core.take(timeout_ms, Some(token), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackError;

    #[test]
    fn test_carries_in_memory_variants() {
        let s = ValueStack::new(Perspective::Lifo);
        s.push(Value::Array(vec![Value::Int(1), Value::Nil])).unwrap();
        s.push(Value::Codeblock(3)).unwrap();
        assert_eq!(s.pop().unwrap(), Value::Codeblock(3));
        assert_eq!(
            s.pop().unwrap(),
            Value::Array(vec![Value::Int(1), Value::Nil])
        );
    }

    #[test]
    fn test_hash_of_values() {
        let s = ValueStack::new(Perspective::Hash);
        s.push_keyed("x", Value::Int(1)).unwrap();
        s.set("y", Value::Str("two".into())).unwrap();
        assert_eq!(s.get("x").unwrap(), Value::Int(1));
        assert_eq!(s.pop_keyed("y").unwrap(), Value::Str("two".into()));
        assert_eq!(
            s.get("y"),
            Err(StackError::KeyNotFound { key: "y".into() })
        );
    }

    #[test]
    fn test_capped() {
        let s = ValueStack::with_capacity(Perspective::Lifo, 1);
        s.push(Value::Bool(true)).unwrap();
        assert_eq!(s.push(Value::Nil), Err(StackError::Full));
    }

    #[test]
    fn test_indexed_perspective() {
        let s = ValueStack::new(Perspective::Indexed);
        s.push(Value::Int(1)).unwrap();
        s.push(Value::Str("two".into())).unwrap();
        assert_eq!(s.peek_at(1).unwrap(), Value::Str("two".into()));
        assert_eq!(s.pop().unwrap(), Value::Int(1));
        assert_eq!(s.pop().unwrap(), Value::Str("two".into()));
    }
}
