//! Work-stealing primitives
//!
//! The language's `spawn` primitive compiles to pushes onto these
//! structures; executor threads drain them as owner (LIFO pop) or thief
//! (FIFO steal). Two containers and one executor:
//!
//! - [`WorkStealingDeque`]: fixed-capacity Chase–Lev deque over atomic
//!   cursors; the fastest path, used by [`WorkerPool`]
//! - [`WSStack`]: the same owner/thief split built from one stack and two
//!   decoupled views; unbounded by default and closeable
//! - [`WorkerPool`]: OS-thread executor with one deque per worker and a
//!   shared injector

pub mod deque;
pub mod pool;
pub mod task;
pub mod ws_stack;

pub use deque::WorkStealingDeque;
pub use pool::{PoolStats, TaskHandler, WorkerPool, WorkerPoolConfig};
pub use task::Task;
pub use ws_stack::WSStack;
