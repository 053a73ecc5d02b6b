//! Atomic cross-stack transfer
//!
//! `bring` moves one element from a source stack into a destination stack
//! as a single critical section: both stacks' locks are held across
//! validation and commit, so no concurrent observer ever sees the element
//! in both stacks, in neither, or duplicated.
//!
//! Lock acquisition is ordered by allocation address, which stays
//! deterministic when two transfers run in opposite directions over the
//! same pair of stacks; a transfer from a stack to itself takes the lock
//! once.

use crate::error::{RuntimeResult, StackError};
use crate::ops::coerce::coerce;
use crate::stack::{Perspective, Stack};

impl Stack {
    /// Atomically transfer one element from `source` into this stack.
    ///
    /// The element is selected by the source's current perspective. When
    /// the element kinds differ the coercion table applies; a failed
    /// coercion leaves both stacks unchanged.
    ///
    /// `params` are positional: when this stack's perspective is Hash the
    /// first parameter is the destination key (`MissingKey` if absent);
    /// the next parameter, if present, is a numeric base for
    /// Int64↔String conversion.
    pub fn bring(&self, source: &Stack, params: &[&str]) -> RuntimeResult<()> {
        let src_mutex = source.core.raw();
        let dst_mutex = self.core.raw();

        if std::ptr::eq(src_mutex, dst_mutex) {
            return self.bring_from_self(params);
        }

        let src_addr = src_mutex as *const _ as usize;
        let dst_addr = dst_mutex as *const _ as usize;
        let (mut src_guard, mut dst_guard) = if src_addr < dst_addr {
            let src = src_mutex.lock();
            let dst = dst_mutex.lock();
            (src, dst)
        } else {
            let dst = dst_mutex.lock();
            let src = src_mutex.lock();
            (src, dst)
        };

        // Validation phase: nothing below may mutate either stack.
        let pos = src_guard.transfer_resolve()?;
        let (key, base) = split_params(dst_guard.perspective(), params, source, self)?;
        dst_guard.transfer_check_push(key, self.core.capacity())?;
        let converted = coerce(
            src_guard.transfer_peek(pos),
            source.kind(),
            self.kind(),
            base,
        )?;

        // Commit phase: pure state mutation.
        src_guard.transfer_remove(pos);
        let stored_key = dst_guard
            .perspective()
            .requires_key()
            .then(|| key.map(str::to_string))
            .flatten();
        dst_guard.transfer_append(converted, stored_key);
        drop(src_guard);
        drop(dst_guard);
        self.core.notify_one();
        Ok(())
    }

    /// Transfer where source and destination are the same stack: the
    /// element is re-appended under the destination discipline.
    fn bring_from_self(&self, params: &[&str]) -> RuntimeResult<()> {
        let mut guard = self.core.raw().lock();
        let pos = guard.transfer_resolve()?;
        let (key, _) = split_params(guard.perspective(), params, self, self)?;
        // Removal frees a slot, so capacity cannot fail; frozen/closed and
        // the key requirement still can.
        guard.transfer_check_push(key, None)?;
        let payload = guard.transfer_remove(pos);
        let stored_key = guard
            .perspective()
            .requires_key()
            .then(|| key.map(str::to_string))
            .flatten();
        guard.transfer_append(payload, stored_key);
        drop(guard);
        self.core.notify_one();
        Ok(())
    }
}

/// Split positional params into destination key and numeric base.
fn split_params<'a>(
    dest_perspective: Perspective,
    params: &[&'a str],
    source: &Stack,
    dest: &Stack,
) -> RuntimeResult<(Option<&'a str>, Option<u32>)> {
    let (key, rest) = if dest_perspective.requires_key() {
        match params.split_first() {
            Some((key, rest)) => (Some(*key), rest),
            None => return Err(StackError::MissingKey),
        }
    } else {
        (None, params)
    };
    let base = match rest.first() {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
            StackError::coercion(
                source.kind(),
                dest.kind(),
                format!("invalid base {raw:?}"),
            )
        })?),
        None => None,
    };
    Ok((key, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_int64, encode_int64, ElementKind};
    use crate::stack::Perspective;

    #[test]
    fn test_bring_same_kind_moves_bytes_unchanged() {
        let a = Stack::new(Perspective::Lifo, ElementKind::Bytes);
        let b = Stack::new(Perspective::Lifo, ElementKind::Bytes);
        a.push(vec![1, 2, 3]).unwrap();
        b.bring(&a, &[]).unwrap();
        assert_eq!(a.len(), 0);
        assert_eq!(b.pop().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_bring_with_coercion() {
        let a = Stack::new(Perspective::Lifo, ElementKind::Str);
        let b = Stack::new(Perspective::Lifo, ElementKind::Int64);
        a.push(b"42".to_vec()).unwrap();
        b.bring(&a, &[]).unwrap();
        assert_eq!(a.len(), 0);
        assert_eq!(decode_int64(&b.pop().unwrap()), 42);
    }

    #[test]
    fn test_failed_coercion_leaves_both_stacks_unchanged() {
        let a = Stack::new(Perspective::Lifo, ElementKind::Str);
        let b = Stack::new(Perspective::Lifo, ElementKind::Int64);
        a.push(b"not a number".to_vec()).unwrap();
        let err = b.bring(&a, &[]).unwrap_err();
        assert!(matches!(err, StackError::CoercionFailed { .. }));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 0);
    }

    #[test]
    fn test_bring_respects_source_perspective() {
        let a = Stack::new(Perspective::Fifo, ElementKind::Int64);
        let b = Stack::new(Perspective::Lifo, ElementKind::Int64);
        a.push(encode_int64(1)).unwrap();
        a.push(encode_int64(2)).unwrap();
        b.bring(&a, &[]).unwrap();
        assert_eq!(decode_int64(&b.pop().unwrap()), 1);
    }

    #[test]
    fn test_bring_into_hash_needs_key() {
        let a = Stack::new(Perspective::Lifo, ElementKind::Int64);
        let b = Stack::new(Perspective::Hash, ElementKind::Int64);
        a.push(encode_int64(5)).unwrap();
        assert_eq!(b.bring(&a, &[]), Err(StackError::MissingKey));
        assert_eq!(a.len(), 1);
        b.bring(&a, &["answer"]).unwrap();
        assert_eq!(decode_int64(&b.get("answer").unwrap()), 5);
    }

    #[test]
    fn test_bring_with_base_param() {
        let a = Stack::new(Perspective::Lifo, ElementKind::Int64);
        let b = Stack::new(Perspective::Lifo, ElementKind::Str);
        a.push(encode_int64(255)).unwrap();
        b.bring(&a, &["16"]).unwrap();
        assert_eq!(b.pop().unwrap(), b"ff".to_vec());
    }

    #[test]
    fn test_bring_full_destination_fails_cleanly() {
        let a = Stack::new(Perspective::Lifo, ElementKind::Int64);
        let b = Stack::with_capacity(Perspective::Lifo, ElementKind::Int64, 1);
        a.push(encode_int64(1)).unwrap();
        a.push(encode_int64(2)).unwrap();
        b.bring(&a, &[]).unwrap();
        assert_eq!(b.bring(&a, &[]), Err(StackError::Full));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_bring_from_empty_source() {
        let a = Stack::new(Perspective::Lifo, ElementKind::Int64);
        let b = Stack::new(Perspective::Lifo, ElementKind::Int64);
        assert_eq!(b.bring(&a, &[]), Err(StackError::Empty));
    }

    #[test]
    fn test_bring_from_self_requeues_element() {
        let a = Stack::new(Perspective::Fifo, ElementKind::Int64);
        a.push(encode_int64(1)).unwrap();
        a.push(encode_int64(2)).unwrap();
        a.bring(&a, &[]).unwrap();
        assert_eq!(a.len(), 2);
        // Oldest element moved to the back of the queue.
        assert_eq!(decode_int64(&a.pop().unwrap()), 2);
        assert_eq!(decode_int64(&a.pop().unwrap()), 1);
    }

    #[test]
    fn test_opposing_transfers_do_not_deadlock() {
        use std::sync::Arc;
        let a = Arc::new(Stack::new(Perspective::Lifo, ElementKind::Int64));
        let b = Arc::new(Stack::new(Perspective::Lifo, ElementKind::Int64));
        for i in 0..500 {
            a.push(encode_int64(i)).unwrap();
            b.push(encode_int64(-i)).unwrap();
        }
        let forward = {
            let (a, b) = (Arc::clone(&a), Arc::clone(&b));
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let _ = b.bring(&a, &[]);
                }
            })
        };
        let backward = {
            let (a, b) = (Arc::clone(&a), Arc::clone(&b));
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let _ = a.bring(&b, &[]);
                }
            })
        };
        forward.join().unwrap();
        backward.join().unwrap();
        // Conservation: transfers move elements, never create or drop them.
        assert_eq!(a.len() + b.len(), 1000);
    }
}
