//! View-based work-stealing stack
//!
//! Where [`WorkStealingDeque`](crate::worksteal::WorkStealingDeque) is a
//! fixed window of atomics, [`WSStack`] builds the same owner/thief split
//! out of the runtime's own primitives: one byte stack, observed through
//! a LIFO view by the owner and a FIFO view by thieves. It grows without
//! bound unless capped, and it supports the stack lifecycle (`close`)
//! that the raw deque does not.

use crate::encoding::ElementKind;
use crate::stack::{Perspective, Stack, View};
use crate::worksteal::Task;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Work-stealing container over decoupled stack views
pub struct WSStack {
    stack: Arc<Stack>,
    owner_view: View,
    thief_view: View,
    closed: AtomicBool,
}

impl WSStack {
    /// Create an unbounded work-stealing stack.
    pub fn new() -> Self {
        Self::build(Arc::new(Stack::new(Perspective::Lifo, ElementKind::Bytes)))
    }

    /// Create a work-stealing stack that refuses pushes past `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Arc::new(Stack::with_capacity(
            Perspective::Lifo,
            ElementKind::Bytes,
            capacity,
        )))
    }

    fn build(stack: Arc<Stack>) -> Self {
        Self {
            owner_view: View::lifo(Arc::clone(&stack)),
            thief_view: View::fifo(Arc::clone(&stack)),
            stack,
            closed: AtomicBool::new(false),
        }
    }

    /// Push a task (owner). Returns `false` when closed or at capacity.
    pub fn push(&self, task: Task) -> bool {
        if self.closed.load(Ordering::Relaxed) {
            return false;
        }
        self.owner_view.push(task.to_bytes()).is_ok()
    }

    /// Pop the newest task (owner).
    pub fn pop(&self) -> Option<Task> {
        self.owner_view
            .pop()
            .ok()
            .and_then(|bytes| Task::from_bytes(&bytes))
    }

    /// Steal the oldest task (thief).
    pub fn steal(&self) -> Option<Task> {
        self.thief_view
            .pop()
            .ok()
            .and_then(|bytes| Task::from_bytes(&bytes))
    }

    /// Tasks currently queued.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether no tasks are queued.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Stop accepting pushes. One-way; queued tasks remain drainable.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.stack.close();
    }

    /// Whether the stack is closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for WSStack {
    fn default() -> Self {
        Self::new()
    }
}
