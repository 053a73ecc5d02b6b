//! Error taxonomy for the runtime
//!
//! Every fallible operation in the runtime returns one of these variants.
//! The names are part of the external contract: compiled Strata programs
//! match on them to implement source-level behaviour, so they are stable
//! across releases. Errors are ordinary values; the runtime never logs,
//! panics, or terminates the process on an error it returns.

use crate::encoding::ElementKind;
use thiserror::Error;

/// Runtime errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// Pop or peek on a stack with no live slots
    #[error("stack is empty")]
    Empty,

    /// Push on a stack whose capacity limit is reached
    #[error("stack is full")]
    Full,

    /// Mutating operation on a frozen stack
    #[error("stack is frozen")]
    Frozen,

    /// Push on a closed stack, or a drained pop/take after close
    #[error("stack is closed")]
    Closed,

    /// Payload does not match the stack's declared element kind
    #[error("type mismatch: stack holds {expected}, payload is not a valid {expected}")]
    TypeMismatch {
        /// The element kind the stack was created with
        expected: ElementKind,
    },

    /// A key was required (Hash perspective) but not supplied
    #[error("missing key: operation requires a key on a Hash stack")]
    MissingKey,

    /// The supplied key is not present among live slots
    #[error("key not found: {key}")]
    KeyNotFound {
        /// The key that was looked up
        key: String,
    },

    /// Index or offset outside the live slot range
    #[error("index out of range: {index} (live slots: {len})")]
    IndexOutOfRange {
        /// The requested index or offset
        index: usize,
        /// Number of live slots at the time of the call
        len: usize,
    },

    /// A cross-kind transfer could not convert the payload
    #[error("coercion failed: {from} -> {to}: {reason}")]
    CoercionFailed {
        /// Source element kind
        from: ElementKind,
        /// Destination element kind
        to: ElementKind,
        /// What went wrong
        reason: String,
    },

    /// A bulk transfer cannot fit within the destination's capacity
    #[error("capacity exceeded: destination can accept {available} of {required} elements")]
    CapacityExceeded {
        /// Elements the destination can still accept
        available: usize,
        /// Elements the transfer would add
        required: usize,
    },

    /// A blocking take was cancelled through its token
    #[error("operation cancelled")]
    Cancelled,

    /// A blocking take reached its deadline with no element available
    #[error("timed out waiting for an element")]
    Timeout,
}

impl StackError {
    /// Coercion failure with the standard payload.
    pub(crate) fn coercion(from: ElementKind, to: ElementKind, reason: impl Into<String>) -> Self {
        StackError::CoercionFailed {
            from,
            to,
            reason: reason.into(),
        }
    }
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, StackError>;
