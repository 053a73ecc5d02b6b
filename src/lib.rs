//! # Strata Runtime
//!
//! The runtime library for the Strata stack-oriented programming
//! language. Compiled Strata programs and the interpreter target this
//! crate as their sole substrate: every variable, parameter, and
//! intermediate result lives in a typed, concurrent, perspective-
//! switchable stack, and the `spawn` primitive schedules work over the
//! work-stealing structures.
//!
//! ## Architecture
//!
//! - `encoding`: canonical byte encodings for the primitive element kinds
//!   and the dynamic `Value` union
//! - `stack`: the generic byte stack, its specialised int64 and Value
//!   forms, the lock-free `FastInt64Stack`, and decoupled `View`s
//! - `ops`: cross-stack operators: atomic `bring` with kind coercion,
//!   and the `walk`/`filter`/`reduce`/`map` bulk family
//! - `worksteal`: Chase–Lev deque, the view-based `WSStack`, and the
//!   `WorkerPool` executor
//! - `scope`: lexical variable scopes for the interpreter
//! - `error`: the stable error taxonomy
//! - `cancel`: cooperative cancellation for blocking takes

#![warn(missing_docs)]
#![warn(clippy::all)]

// Error taxonomy
pub mod error;

// Cancellation tokens
pub mod cancel;

// Byte encodings and the dynamic value union
pub mod encoding;

// Stack flavours and views
pub mod stack;

// Cross-stack operators
pub mod ops;

// Work-stealing primitives and the executor
pub mod worksteal;

// Interpreter scopes
pub mod scope;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use encoding::{value::Value, ElementKind};
pub use error::{RuntimeResult, StackError};
pub use ops::{filter, map, reduce, walk};
pub use scope::ScopeStack;
pub use stack::{
    CompactionPolicy, FastInt64Stack, Int64Stack, Int64View, Perspective, Stack, ValueStack, View,
};
pub use worksteal::{Task, WSStack, WorkStealingDeque, WorkerPool, WorkerPoolConfig};

/// Re-export version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
