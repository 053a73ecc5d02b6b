//! Bulk transformation operators
//!
//! The walk family reads a snapshot of the source in its perspective's
//! iteration order (LIFO newest-first, FIFO and Indexed oldest-first,
//! Hash insertion order) and produces into a destination or accumulator.
//! The source is never mutated, so a frozen source is valid input.
//!
//! Element-level transform failures never abort a walk: the failure
//! message is pushed onto the optional error stack, in order of
//! occurrence, and the element is skipped. Errors about the operation as
//! a whole (a frozen or closed destination, a destination that cannot fit
//! the transfer) are returned to the caller up front.

use crate::error::{RuntimeResult, StackError};
use crate::stack::{Perspective, Stack};

/// Element-level failure message produced by a transform or predicate.
pub type ElementError = String;

/// Transform every element of `source` into `dest`. Returns the number of
/// elements delivered.
///
/// The destination receives elements through its own push discipline; a
/// Hash destination reuses the source slot's key when one exists and
/// otherwise keys the element by its snapshot position.
pub fn walk<F>(
    source: &Stack,
    dest: &Stack,
    mut transform: F,
    errors: Option<&Stack>,
) -> RuntimeResult<usize>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, ElementError>,
{
    let snapshot = source.core.snapshot(None);
    check_dest(dest, snapshot.len())?;
    let mut delivered = 0;
    for (position, (payload, key)) in snapshot.into_iter().enumerate() {
        match transform(&payload) {
            Ok(out) => match push_out(dest, out, key, position) {
                Ok(()) => delivered += 1,
                Err(e) => forward(errors, &e.to_string()),
            },
            Err(message) => forward(errors, &message),
        }
    }
    Ok(delivered)
}

/// Copy the elements of `source` that satisfy `predicate` into `dest`.
/// Returns the number of elements delivered.
pub fn filter<F>(
    source: &Stack,
    dest: &Stack,
    mut predicate: F,
    errors: Option<&Stack>,
) -> RuntimeResult<usize>
where
    F: FnMut(&[u8]) -> Result<bool, ElementError>,
{
    let snapshot = source.core.snapshot(None);
    check_dest(dest, snapshot.len())?;
    let mut delivered = 0;
    for (position, (payload, key)) in snapshot.into_iter().enumerate() {
        match predicate(&payload) {
            Ok(true) => match push_out(dest, payload, key, position) {
                Ok(()) => delivered += 1,
                Err(e) => forward(errors, &e.to_string()),
            },
            Ok(false) => {}
            Err(message) => forward(errors, &message),
        }
    }
    Ok(delivered)
}

/// Fold left over `source` with `combine`, starting from `initial`.
/// The source is not mutated. A combine failure skips that element (the
/// accumulator keeps its previous value) and is forwarded to the error
/// stack.
pub fn reduce<F>(
    source: &Stack,
    initial: Vec<u8>,
    mut combine: F,
    errors: Option<&Stack>,
) -> RuntimeResult<Vec<u8>>
where
    F: FnMut(Vec<u8>, &[u8]) -> Result<Vec<u8>, ElementError>,
{
    let snapshot = source.core.snapshot(None);
    let mut acc = initial;
    for (payload, _) in snapshot {
        match combine(acc.clone(), &payload) {
            Ok(next) => acc = next,
            Err(message) => forward(errors, &message),
        }
    }
    Ok(acc)
}

/// Transform every element of `source` into a freshly allocated stack of
/// `result_kind`, preserving the source's perspective (and keys, for Hash
/// sources).
pub fn map<F>(
    source: &Stack,
    mut transform: F,
    result_kind: crate::encoding::ElementKind,
    errors: Option<&Stack>,
) -> RuntimeResult<Stack>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, ElementError>,
{
    let perspective = source.perspective();
    let dest = Stack::new(perspective, result_kind);
    let snapshot = source.core.snapshot(None);
    for (position, (payload, key)) in snapshot.into_iter().enumerate() {
        match transform(&payload) {
            Ok(out) => {
                if let Err(e) = push_out(&dest, out, key, position) {
                    forward(errors, &e.to_string());
                }
            }
            Err(message) => forward(errors, &message),
        }
    }
    Ok(dest)
}

/// Whole-operation destination checks, before any element moves.
fn check_dest(dest: &Stack, incoming: usize) -> RuntimeResult<()> {
    if dest.is_frozen() {
        return Err(StackError::Frozen);
    }
    if dest.is_closed() {
        return Err(StackError::Closed);
    }
    if let Some(cap) = dest.capacity() {
        let available = cap.saturating_sub(dest.len());
        if available < incoming {
            return Err(StackError::CapacityExceeded {
                available,
                required: incoming,
            });
        }
    }
    Ok(())
}

fn push_out(
    dest: &Stack,
    payload: Vec<u8>,
    key: Option<String>,
    position: usize,
) -> RuntimeResult<()> {
    if dest.perspective() == Perspective::Hash {
        let key = key.unwrap_or_else(|| position.to_string());
        dest.push_keyed(&key, payload)
    } else {
        dest.push(payload)
    }
}

/// Best-effort delivery onto the error stack; a full or closed error
/// stack drops the message rather than failing the walk.
fn forward(errors: Option<&Stack>, message: &str) {
    if let Some(stack) = errors {
        let _ = stack.push(message.as_bytes().to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_int64, encode_int64, ElementKind};

    fn int_fifo(values: &[i64]) -> Stack {
        let s = Stack::new(Perspective::Fifo, ElementKind::Int64);
        for &v in values {
            s.push(encode_int64(v)).unwrap();
        }
        s
    }

    #[test]
    fn test_walk_with_error_forwarding() {
        let source = int_fifo(&[10, 0, 20]);
        let dest = Stack::new(Perspective::Fifo, ElementKind::Int64);
        let errors = Stack::new(Perspective::Fifo, ElementKind::Str);

        let delivered = walk(
            &source,
            &dest,
            |payload| {
                let v = decode_int64(payload);
                if v == 0 {
                    Err("division by zero".to_string())
                } else {
                    Ok(encode_int64(100 / v))
                }
            },
            Some(&errors),
        )
        .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(source.len(), 3);
        assert_eq!(decode_int64(&dest.pop().unwrap()), 10);
        assert_eq!(decode_int64(&dest.pop().unwrap()), 5);
        assert_eq!(errors.len(), 1);
        let message = String::from_utf8(errors.pop().unwrap()).unwrap();
        assert!(message.contains("division by zero"));
    }

    #[test]
    fn test_walk_iterates_in_source_perspective_order() {
        let source = Stack::new(Perspective::Lifo, ElementKind::Int64);
        for v in [1, 2, 3] {
            source.push(encode_int64(v)).unwrap();
        }
        let dest = Stack::new(Perspective::Fifo, ElementKind::Int64);
        walk(&source, &dest, |p| Ok(p.to_vec()), None).unwrap();
        // LIFO source walks newest-first.
        assert_eq!(decode_int64(&dest.pop().unwrap()), 3);
        assert_eq!(decode_int64(&dest.pop().unwrap()), 2);
        assert_eq!(decode_int64(&dest.pop().unwrap()), 1);
    }

    #[test]
    fn test_frozen_source_is_valid_frozen_dest_is_not() {
        let source = int_fifo(&[1]);
        source.freeze();
        let dest = Stack::new(Perspective::Fifo, ElementKind::Int64);
        assert_eq!(walk(&source, &dest, |p| Ok(p.to_vec()), None).unwrap(), 1);

        let frozen_dest = Stack::new(Perspective::Fifo, ElementKind::Int64);
        frozen_dest.freeze();
        assert_eq!(
            walk(&source, &frozen_dest, |p| Ok(p.to_vec()), None),
            Err(StackError::Frozen)
        );
    }

    #[test]
    fn test_capacity_checked_up_front() {
        let source = int_fifo(&[1, 2, 3]);
        let dest = Stack::with_capacity(Perspective::Fifo, ElementKind::Int64, 2);
        assert_eq!(
            walk(&source, &dest, |p| Ok(p.to_vec()), None),
            Err(StackError::CapacityExceeded {
                available: 2,
                required: 3
            })
        );
        assert_eq!(dest.len(), 0);
    }

    #[test]
    fn test_filter_true_equals_identity_walk() {
        let source = int_fifo(&[1, 2, 3]);
        let walked = Stack::new(Perspective::Fifo, ElementKind::Int64);
        let filtered = Stack::new(Perspective::Fifo, ElementKind::Int64);
        walk(&source, &walked, |p| Ok(p.to_vec()), None).unwrap();
        filter(&source, &filtered, |_| Ok(true), None).unwrap();
        assert_eq!(walked.len(), filtered.len());
        while let Ok(a) = walked.pop() {
            assert_eq!(a, filtered.pop().unwrap());
        }
    }

    #[test]
    fn test_filter_predicate() {
        let source = int_fifo(&[1, 2, 3, 4]);
        let dest = Stack::new(Perspective::Fifo, ElementKind::Int64);
        let delivered = filter(
            &source,
            &dest,
            |p| Ok(decode_int64(p) % 2 == 0),
            None,
        )
        .unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(decode_int64(&dest.pop().unwrap()), 2);
        assert_eq!(decode_int64(&dest.pop().unwrap()), 4);
    }

    #[test]
    fn test_reduce_folds_left_without_mutating_source() {
        let source = int_fifo(&[1, 2, 3, 4]);
        let sum = reduce(
            &source,
            encode_int64(0),
            |acc, p| Ok(encode_int64(decode_int64(&acc) + decode_int64(p))),
            None,
        )
        .unwrap();
        assert_eq!(decode_int64(&sum), 10);
        assert_eq!(source.len(), 4);
    }

    #[test]
    fn test_reduce_skips_failed_elements() {
        let source = int_fifo(&[1, 0, 3]);
        let errors = Stack::new(Perspective::Fifo, ElementKind::Str);
        let product = reduce(
            &source,
            encode_int64(100),
            |acc, p| {
                let v = decode_int64(p);
                if v == 0 {
                    Err("zero factor".to_string())
                } else {
                    Ok(encode_int64(decode_int64(&acc) * v))
                }
            },
            Some(&errors),
        )
        .unwrap();
        assert_eq!(decode_int64(&product), 300);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_map_allocates_result_stack() {
        let source = int_fifo(&[1, 2]);
        let dest = map(
            &source,
            |p| Ok(decode_int64(p).to_string().into_bytes()),
            ElementKind::Str,
            None,
        )
        .unwrap();
        assert_eq!(dest.kind(), ElementKind::Str);
        assert_eq!(dest.perspective(), Perspective::Fifo);
        assert_eq!(dest.pop().unwrap(), b"1".to_vec());
        assert_eq!(dest.pop().unwrap(), b"2".to_vec());
    }

    #[test]
    fn test_map_preserves_hash_keys() {
        let source = Stack::new(Perspective::Hash, ElementKind::Int64);
        source.push_keyed("a", encode_int64(1)).unwrap();
        source.push_keyed("b", encode_int64(2)).unwrap();
        let dest = map(
            &source,
            |p| Ok(encode_int64(decode_int64(p) * 10)),
            ElementKind::Int64,
            None,
        )
        .unwrap();
        assert_eq!(decode_int64(&dest.get("a").unwrap()), 10);
        assert_eq!(decode_int64(&dest.get("b").unwrap()), 20);
    }

    #[test]
    fn test_hash_source_walks_in_insertion_order() {
        let source = Stack::new(Perspective::Hash, ElementKind::Int64);
        source.push_keyed("x", encode_int64(1)).unwrap();
        source.push_keyed("y", encode_int64(2)).unwrap();
        source.push_keyed("x", encode_int64(3)).unwrap(); // moves to end
        let dest = Stack::new(Perspective::Fifo, ElementKind::Int64);
        walk(&source, &dest, |p| Ok(p.to_vec()), None).unwrap();
        assert_eq!(decode_int64(&dest.pop().unwrap()), 2);
        assert_eq!(decode_int64(&dest.pop().unwrap()), 3);
    }
}
