//! Concurrent perspective-switchable stacks
//!
//! The stack is the only data structure Strata programs have: every
//! variable, parameter, and intermediate result lives in one. A stack's
//! *perspective* decides which slot push/pop/peek select:
//!
//! - **Lifo**: most recently inserted live slot first
//! - **Fifo**: oldest live slot first (queue discipline)
//! - **Indexed**: numerically lowest live index, with direct `get_at`
//! - **Hash**: string-keyed access layered over insertion order
//!
//! All stacks in this module observe one slot sequence as the single
//! source of truth; perspectives are just indexing rules over it. The
//! flavours are:
//!
//! - [`Stack`]: byte payloads tagged with an [`ElementKind`](crate::encoding::ElementKind)
//! - [`Int64Stack`]: native `i64` payloads, skipping the byte round-trip
//! - [`FastInt64Stack`]: lock-free fixed-capacity LIFO over `i64`
//! - [`ValueStack`]: native [`Value`](crate::encoding::value::Value) payloads
//! - [`View`] / [`Int64View`]: decoupled perspective handles

pub mod fast;
pub mod generic;
pub mod int64;
pub(crate) mod slots;
pub mod value_stack;
pub mod view;

pub use fast::FastInt64Stack;
pub use generic::Stack;
pub use int64::{Int64Stack, Int64View};
pub use slots::CompactionPolicy;
pub use value_stack::ValueStack;
pub use view::View;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access discipline for selecting and ordering stack elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perspective {
    /// Last in, first out
    Lifo,
    /// First in, first out
    Fifo,
    /// Access by integer position
    Indexed,
    /// Access by string key
    Hash,
}

impl Perspective {
    /// Whether pushes under this perspective require a key.
    pub fn requires_key(&self) -> bool {
        matches!(self, Perspective::Hash)
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Perspective::Lifo => "LIFO",
            Perspective::Fifo => "FIFO",
            Perspective::Indexed => "Indexed",
            Perspective::Hash => "Hash",
        };
        f.write_str(name)
    }
}
