//! Chase–Lev work-stealing deque
//!
//! A fixed-capacity circular buffer with two monotonically increasing
//! atomic cursors: `top`, the owner's end, and `bottom`, the thieves'
//! end. The logical element count is `top - bottom`, saturated to zero.
//!
//! Exactly one thread, the owner, may call [`push`](WorkStealingDeque::push)
//! and [`pop`](WorkStealingDeque::pop); that discipline is an unchecked
//! precondition. Any number of thieves may call
//! [`steal`](WorkStealingDeque::steal) concurrently. The owner works LIFO
//! at `top`, thieves take the oldest task at `bottom`, and the only
//! contended point is the last remaining element, resolved by a CAS on
//! `bottom`.
//!
//! All three operations are non-blocking: emptiness and saturation are
//! normal returns. Cursors never decrease (the owner's speculative
//! decrement in `pop` is always restored), so a `bottom` CAS can never
//! succeed on a stale value.

use crate::worksteal::Task;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

/// Single-owner, many-thief work-stealing deque
pub struct WorkStealingDeque {
    cells: Vec<Mutex<Option<Task>>>,
    top: AtomicI64,
    bottom: AtomicI64,
    capacity: usize,
}

impl WorkStealingDeque {
    /// Create a deque with room for `capacity` tasks.
    pub fn new(capacity: usize) -> Self {
        let mut cells = Vec::with_capacity(capacity);
        cells.resize_with(capacity, || Mutex::new(None));
        Self {
            cells,
            top: AtomicI64::new(0),
            bottom: AtomicI64::new(0),
            capacity,
        }
    }

    fn cell(&self, cursor: i64) -> &Mutex<Option<Task>> {
        &self.cells[(cursor as usize) % self.capacity]
    }

    /// Owner only. Returns `false` when the deque is saturated.
    pub fn push(&self, task: Task) -> bool {
        let top = self.top.load(Ordering::Relaxed);
        let bottom = self.bottom.load(Ordering::Acquire);
        if (top - bottom) as usize >= self.capacity {
            return false;
        }
        *self.cell(top).lock() = Some(task);
        // Publishes the cell write to thieves reading `top` with acquire.
        self.top.store(top + 1, Ordering::Release);
        true
    }

    /// Owner only. Takes the most recently pushed task, racing thieves
    /// for the final element.
    pub fn pop(&self) -> Option<Task> {
        let top = self.top.load(Ordering::Relaxed) - 1;
        self.top.store(top, Ordering::SeqCst);
        let bottom = self.bottom.load(Ordering::SeqCst);

        if top < bottom {
            // Empty; undo the speculative decrement.
            self.top.store(bottom, Ordering::Relaxed);
            return None;
        }
        if top > bottom {
            // Thieves stop below `top`, so this cell is uncontended.
            return self.cell(top).lock().take();
        }
        // Last element: whoever advances `bottom` owns it.
        let won = self
            .bottom
            .compare_exchange(bottom, bottom + 1, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok();
        self.top.store(bottom + 1, Ordering::Relaxed);
        if won {
            self.cell(top).lock().take()
        } else {
            None
        }
    }

    /// Thief side. Takes the oldest task, or `None` when the deque is
    /// empty or another thief won the race.
    pub fn steal(&self) -> Option<Task> {
        let bottom = self.bottom.load(Ordering::Acquire);
        let top = self.top.load(Ordering::Acquire);
        if bottom >= top {
            return None;
        }
        // Read before reserving: once the CAS lands the owner may refill
        // this cell. The monotone cursor rules out ABA on the CAS.
        let task = self.cell(bottom).lock().clone();
        if self
            .bottom
            .compare_exchange(bottom, bottom + 1, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            task
        } else {
            None
        }
    }

    /// Approximate element count (exact when quiescent).
    pub fn len(&self) -> usize {
        let top = self.top.load(Ordering::Acquire);
        let bottom = self.bottom.load(Ordering::Acquire);
        (top - bottom).max(0) as usize
    }

    /// Whether the deque is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
