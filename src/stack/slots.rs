//! Slot-sequence core shared by every stack flavour
//!
//! [`Slots`] owns the ordered slot sequence, the hash index, the FIFO head
//! cursor, and the lifecycle flags; it performs no locking of its own.
//! [`SyncStack`] wraps it in a `parking_lot::Mutex` plus a `Condvar` for
//! blocking takers and implements the full concurrent operation surface.
//! The public stack types ([`Stack`](crate::stack::Stack),
//! [`Int64Stack`](crate::stack::Int64Stack),
//! [`ValueStack`](crate::stack::ValueStack)) are thin façades over
//! `SyncStack` at their payload type.
//!
//! Removal marks a slot dead rather than shifting the sequence; dead slots
//! are swept by compaction once they outnumber the live ones, preserving
//! both payload order and the hash index.

use crate::cancel::CancelToken;
use crate::error::{RuntimeResult, StackError};
use crate::stack::Perspective;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often a blocking take rechecks its cancellation token.
const CANCEL_POLL: Duration = Duration::from_millis(5);

/// Tuning for the dead-slot sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionPolicy {
    /// Never sweep while fewer than this many slots are dead.
    pub min_dead: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self { min_dead: 128 }
    }
}

/// Element selector shared by pop/peek/get
#[derive(Debug)]
pub(crate) enum Selector<'a> {
    /// The slot the perspective's default rule picks
    Default,
    /// The n-th live slot in the perspective's iteration order
    Offset(usize),
    /// The live slot carrying this key
    Key(&'a str),
}

struct Slot<T> {
    payload: T,
    key: Option<String>,
    live: bool,
}

/// Unlocked slot sequence. All invariants live here:
/// `live` equals the number of live slots, the index maps exactly the keys
/// of live keyed slots to their positions, and every position below `head`
/// is dead.
pub(crate) struct Slots<T> {
    slots: Vec<Slot<T>>,
    index: HashMap<String, usize>,
    head: usize,
    live: usize,
    perspective: Perspective,
    frozen: bool,
    closed: bool,
    policy: CompactionPolicy,
}

impl<T: Clone> Slots<T> {
    fn new(perspective: Perspective, policy: CompactionPolicy) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            head: 0,
            live: 0,
            perspective,
            frozen: false,
            closed: false,
            policy,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub(crate) fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Append a slot. A key that is already present replaces the old
    /// slot's payload and moves it to the end of insertion order.
    fn append(&mut self, payload: T, key: Option<String>) {
        if let Some(k) = &key {
            if let Some(old) = self.index.get(k).copied() {
                self.slots[old].live = false;
                self.slots[old].key = None;
                self.live -= 1;
            }
        }
        let pos = self.slots.len();
        if let Some(k) = &key {
            self.index.insert(k.clone(), pos);
        }
        self.slots.push(Slot {
            payload,
            key,
            live: true,
        });
        self.live += 1;
        self.maybe_compact();
    }

    /// Resolve a selector to a slot position under the given perspective.
    fn resolve(&self, perspective: Perspective, selector: &Selector<'_>) -> RuntimeResult<usize> {
        match selector {
            Selector::Default => {
                if self.live == 0 {
                    return Err(StackError::Empty);
                }
                let found = match perspective {
                    // Hash without a key reads as LIFO: newest live slot.
                    Perspective::Lifo | Perspective::Hash => self.top_live(),
                    Perspective::Fifo | Perspective::Indexed => self.front_live(),
                };
                found.ok_or(StackError::Empty)
            }
            Selector::Offset(offset) => {
                if self.live == 0 {
                    return Err(StackError::Empty);
                }
                let found = match perspective {
                    Perspective::Lifo => self.nth_live_from_top(*offset),
                    Perspective::Fifo | Perspective::Indexed | Perspective::Hash => {
                        self.nth_live_from_front(*offset)
                    }
                };
                found.ok_or(StackError::IndexOutOfRange {
                    index: *offset,
                    len: self.live,
                })
            }
            Selector::Key(key) => {
                self.index
                    .get(*key)
                    .copied()
                    .ok_or_else(|| StackError::KeyNotFound {
                        key: (*key).to_string(),
                    })
            }
        }
    }

    fn top_live(&self) -> Option<usize> {
        (self.head..self.slots.len())
            .rev()
            .find(|&i| self.slots[i].live)
    }

    fn front_live(&self) -> Option<usize> {
        (self.head..self.slots.len()).find(|&i| self.slots[i].live)
    }

    fn nth_live_from_front(&self, n: usize) -> Option<usize> {
        (self.head..self.slots.len())
            .filter(|&i| self.slots[i].live)
            .nth(n)
    }

    fn nth_live_from_top(&self, n: usize) -> Option<usize> {
        (self.head..self.slots.len())
            .rev()
            .filter(|&i| self.slots[i].live)
            .nth(n)
    }

    fn payload_at(&self, pos: usize) -> &T {
        &self.slots[pos].payload
    }

    /// Remove the slot at `pos`, keeping the sequence invariants.
    fn remove_at(&mut self, pos: usize) -> T {
        let payload = self.slots[pos].payload.clone();
        self.slots[pos].live = false;
        self.live -= 1;
        if let Some(k) = self.slots[pos].key.take() {
            self.index.remove(&k);
        }
        while self.slots.last().is_some_and(|s| !s.live) {
            self.slots.pop();
        }
        if self.head > self.slots.len() {
            self.head = self.slots.len();
        }
        while self.head < self.slots.len() && !self.slots[self.head].live {
            self.head += 1;
        }
        self.maybe_compact();
        payload
    }

    /// Upsert by key: replace the payload in place when the key is live,
    /// append a new keyed slot otherwise.
    fn set_key(&mut self, key: &str, payload: T) {
        if let Some(pos) = self.index.get(key).copied() {
            self.slots[pos].payload = payload;
        } else {
            self.append(payload, Some(key.to_string()));
        }
    }

    fn maybe_compact(&mut self) {
        let dead = self.slots.len() - self.live;
        if dead >= self.policy.min_dead && dead * 2 >= self.slots.len() {
            self.compact();
        }
    }

    /// Sweep dead slots, preserving payload order and the hash index.
    fn compact(&mut self) {
        let mut kept = Vec::with_capacity(self.live);
        for slot in self.slots.drain(..) {
            if slot.live {
                kept.push(slot);
            }
        }
        self.slots = kept;
        self.head = 0;
        self.index.clear();
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(k) = &slot.key {
                self.index.insert(k.clone(), pos);
            }
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.head = 0;
        self.live = 0;
    }

    fn set_perspective(&mut self, perspective: Perspective) {
        let old = self.perspective;
        self.perspective = perspective;
        if perspective == Perspective::Hash && old != Perspective::Hash {
            // Keyless live slots become reachable under generated
            // positional keys.
            for pos in self.head..self.slots.len() {
                if !self.slots[pos].live || self.slots[pos].key.is_some() {
                    continue;
                }
                let mut key = pos.to_string();
                while self.index.contains_key(&key) {
                    key.push('_');
                }
                self.index.insert(key.clone(), pos);
                self.slots[pos].key = Some(key);
            }
        }
    }

    /// Snapshot live `(payload, key)` pairs in the given perspective's
    /// iteration order: LIFO newest-first, everything else oldest-first
    /// (Hash iterates insertion order).
    pub(crate) fn snapshot(&self, perspective: Perspective) -> Vec<(T, Option<String>)> {
        let pairs = |i: usize| (self.slots[i].payload.clone(), self.slots[i].key.clone());
        match perspective {
            Perspective::Lifo => (self.head..self.slots.len())
                .rev()
                .filter(|&i| self.slots[i].live)
                .map(pairs)
                .collect(),
            Perspective::Fifo | Perspective::Indexed | Perspective::Hash => (self.head
                ..self.slots.len())
                .filter(|&i| self.slots[i].live)
                .map(pairs)
                .collect(),
        }
    }
}

/// Mutex + condvar wrapper implementing the concurrent operation surface.
///
/// `perspective` parameters of `None` mean "the stack's current
/// perspective"; views pass their own.
pub(crate) struct SyncStack<T> {
    capacity: Option<usize>,
    inner: Mutex<Slots<T>>,
    available: Condvar,
}

impl<T: Clone> SyncStack<T> {
    pub(crate) fn new(
        perspective: Perspective,
        capacity: Option<usize>,
        policy: CompactionPolicy,
    ) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Slots::new(perspective, policy)),
            available: Condvar::new(),
        }
    }

    pub(crate) fn push(
        &self,
        payload: T,
        key: Option<&str>,
        perspective: Option<Perspective>,
    ) -> RuntimeResult<()> {
        let mut inner = self.inner.lock();
        if inner.frozen {
            return Err(StackError::Frozen);
        }
        if inner.closed {
            return Err(StackError::Closed);
        }
        let storage_keyed = inner.perspective.requires_key();
        let effective = perspective.unwrap_or(inner.perspective);
        if (storage_keyed || effective.requires_key()) && key.is_none() {
            return Err(StackError::MissingKey);
        }
        // A keyed re-push replaces a live slot and does not grow the stack.
        let replacing = storage_keyed && key.is_some_and(|k| inner.contains_key(k));
        if !replacing {
            if let Some(cap) = self.capacity {
                if inner.len() >= cap {
                    return Err(StackError::Full);
                }
            }
        }
        // Keys are only retained under Hash storage; elsewhere a supplied
        // key is semantically keyless.
        let stored_key = if storage_keyed {
            key.map(str::to_string)
        } else {
            None
        };
        inner.append(payload, stored_key);
        drop(inner);
        self.available.notify_one();
        Ok(())
    }

    pub(crate) fn pop(
        &self,
        selector: Selector<'_>,
        perspective: Option<Perspective>,
    ) -> RuntimeResult<T> {
        let mut inner = self.inner.lock();
        if inner.frozen {
            return Err(StackError::Frozen);
        }
        let effective = perspective.unwrap_or(inner.perspective);
        match inner.resolve(effective, &selector) {
            Ok(pos) => Ok(inner.remove_at(pos)),
            Err(StackError::Empty) if inner.closed => Err(StackError::Closed),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn peek(
        &self,
        selector: Selector<'_>,
        perspective: Option<Perspective>,
    ) -> RuntimeResult<T> {
        let inner = self.inner.lock();
        let effective = perspective.unwrap_or(inner.perspective);
        let pos = inner.resolve(effective, &selector)?;
        Ok(inner.payload_at(pos).clone())
    }

    pub(crate) fn set(&self, key: &str, payload: T) -> RuntimeResult<()> {
        let mut inner = self.inner.lock();
        if inner.frozen {
            return Err(StackError::Frozen);
        }
        if inner.closed {
            return Err(StackError::Closed);
        }
        let inserting = !inner.contains_key(key);
        if inserting {
            if let Some(cap) = self.capacity {
                if inner.len() >= cap {
                    return Err(StackError::Full);
                }
            }
        }
        inner.set_key(key, payload);
        drop(inner);
        if inserting {
            self.available.notify_one();
        }
        Ok(())
    }

    pub(crate) fn get(&self, key: &str) -> RuntimeResult<T> {
        let inner = self.inner.lock();
        let pos = inner.resolve(inner.perspective, &Selector::Key(key))?;
        Ok(inner.payload_at(pos).clone())
    }

    /// Positional read over live slots, oldest first, regardless of the
    /// current perspective.
    pub(crate) fn get_at(&self, index: usize) -> RuntimeResult<T> {
        let inner = self.inner.lock();
        if inner.is_empty() {
            return Err(StackError::Empty);
        }
        let pos = inner
            .nth_live_from_front(index)
            .ok_or(StackError::IndexOutOfRange {
                index,
                len: inner.len(),
            })?;
        Ok(inner.payload_at(pos).clone())
    }

    /// Blocking pop: suspends until an element is available, the deadline
    /// elapses (`timeout_ms` of zero waits indefinitely), the token is
    /// cancelled, or the stack is closed or frozen.
    pub(crate) fn take(
        &self,
        timeout_ms: u64,
        token: Option<&CancelToken>,
        perspective: Option<Perspective>,
    ) -> RuntimeResult<T> {
        let deadline = (timeout_ms > 0).then(|| Instant::now() + Duration::from_millis(timeout_ms));
        let mut inner = self.inner.lock();
        loop {
            if inner.frozen {
                return Err(StackError::Frozen);
            }
            let effective = perspective.unwrap_or(inner.perspective);
            match inner.resolve(effective, &Selector::Default) {
                Ok(pos) => return Ok(inner.remove_at(pos)),
                Err(StackError::Empty) => {}
                Err(e) => return Err(e),
            }
            if inner.closed {
                return Err(StackError::Closed);
            }
            if token.is_some_and(CancelToken::is_cancelled) {
                return Err(StackError::Cancelled);
            }
            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                return Err(StackError::Timeout);
            }
            // With a token in play the wait is sliced so cancellation is
            // observed promptly even when nobody notifies the condvar.
            let wake_at = match (deadline, token.is_some()) {
                (Some(d), true) => Some(d.min(now + CANCEL_POLL)),
                (Some(d), false) => Some(d),
                (None, true) => Some(now + CANCEL_POLL),
                (None, false) => None,
            };
            match wake_at {
                Some(at) => {
                    let _ = self.available.wait_until(&mut inner, at);
                }
                None => self.available.wait(&mut inner),
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub(crate) fn is_full(&self) -> bool {
        match self.capacity {
            Some(cap) => self.inner.lock().len() >= cap,
            None => false,
        }
    }

    pub(crate) fn perspective(&self) -> Perspective {
        self.inner.lock().perspective()
    }

    pub(crate) fn set_perspective(&self, perspective: Perspective) -> RuntimeResult<()> {
        let mut inner = self.inner.lock();
        if inner.frozen {
            return Err(StackError::Frozen);
        }
        inner.set_perspective(perspective);
        Ok(())
    }

    pub(crate) fn freeze(&self) {
        let mut inner = self.inner.lock();
        if !inner.frozen {
            inner.compact();
            inner.frozen = true;
            debug!(len = inner.len(), "stack frozen");
        }
        drop(inner);
        // Pending takers must observe the transition.
        self.available.notify_all();
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.inner.lock().is_frozen()
    }

    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        if !inner.closed {
            inner.closed = true;
            debug!(len = inner.len(), "stack closed");
        }
        drop(inner);
        self.available.notify_all();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    pub(crate) fn clear(&self) -> RuntimeResult<()> {
        let mut inner = self.inner.lock();
        if inner.frozen {
            return Err(StackError::Frozen);
        }
        inner.clear();
        Ok(())
    }

    /// Snapshot for the bulk operators; order follows `perspective` or the
    /// stack's current one.
    pub(crate) fn snapshot(&self, perspective: Option<Perspective>) -> Vec<(T, Option<String>)> {
        let inner = self.inner.lock();
        let effective = perspective.unwrap_or(inner.perspective);
        inner.snapshot(effective)
    }

    /// Raw access for the cross-stack transfer, which must hold both
    /// stacks' locks across validate and commit.
    pub(crate) fn raw(&self) -> &Mutex<Slots<T>> {
        &self.inner
    }

    /// Wake one blocked taker after an out-of-band append through
    /// [`raw`](Self::raw).
    pub(crate) fn notify_one(&self) {
        self.available.notify_one();
    }
}

/// Commit-side helpers for the cross-stack transfer; callers hold the
/// guard obtained through [`SyncStack::raw`].
impl<T: Clone> Slots<T> {
    pub(crate) fn transfer_resolve(&self) -> RuntimeResult<usize> {
        if self.frozen {
            return Err(StackError::Frozen);
        }
        match self.resolve(self.perspective, &Selector::Default) {
            Err(StackError::Empty) if self.closed => Err(StackError::Closed),
            other => other,
        }
    }

    pub(crate) fn transfer_peek(&self, pos: usize) -> &T {
        self.payload_at(pos)
    }

    pub(crate) fn transfer_remove(&mut self, pos: usize) -> T {
        self.remove_at(pos)
    }

    pub(crate) fn transfer_append(&mut self, payload: T, key: Option<String>) {
        self.append(payload, key);
    }

    /// Destination-side validation: everything that could make the commit
    /// fail is checked here, before any mutation.
    pub(crate) fn transfer_check_push(
        &self,
        key: Option<&str>,
        capacity: Option<usize>,
    ) -> RuntimeResult<()> {
        if self.frozen {
            return Err(StackError::Frozen);
        }
        if self.closed {
            return Err(StackError::Closed);
        }
        if self.perspective.requires_key() && key.is_none() {
            return Err(StackError::MissingKey);
        }
        let replacing =
            self.perspective.requires_key() && key.is_some_and(|k| self.contains_key(k));
        if !replacing {
            if let Some(cap) = capacity {
                if self.len() >= cap {
                    return Err(StackError::Full);
                }
            }
        }
        Ok(())
    }
}
