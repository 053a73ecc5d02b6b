//! Cross-stack operators
//!
//! Two families of operation move data between stacks:
//!
//! - [`bring`](crate::stack::Stack::bring): atomic transfer of a single
//!   element, with cross-kind coercion when the stacks' element kinds
//!   differ
//! - [`walk`], [`filter`], [`reduce`], [`map`]: bulk transformation over a
//!   non-destructive snapshot of the source, with per-element error
//!   forwarding onto an optional error stack

pub(crate) mod bring;
pub(crate) mod coerce;
pub mod walk;

pub use walk::{filter, map, reduce, walk};
