//! Canonical byte encodings for stack payloads
//!
//! Every payload travels through the runtime as a byte slice tagged by the
//! owning stack's declared element kind. The encodings are fixed because
//! compiled output and interpreted execution share stacks byte-for-byte:
//!
//! - `Int64` / `Uint64`: 8 bytes, big-endian (two's complement for Int64)
//! - `Float64`: IEEE-754 bits stored as a big-endian u64
//! - `String` / `Bytes`: the bytes themselves
//! - `Bool`: 1 byte, zero is false, non-zero is true
//!
//! Decoders are total: truncated or malformed input yields the zero
//! element of the kind rather than an error.

pub mod value;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element kind declared by a stack at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// 64-bit signed integer
    Int64,
    /// 64-bit unsigned integer
    Uint64,
    /// 64-bit IEEE-754 float
    Float64,
    /// UTF-8 text (the stack retains only the bytes)
    Str,
    /// Raw bytes
    Bytes,
    /// Boolean
    Bool,
}

impl ElementKind {
    /// Fixed payload width in bytes, or `None` for variable-length kinds.
    pub fn payload_len(&self) -> Option<usize> {
        match self {
            ElementKind::Int64 | ElementKind::Uint64 | ElementKind::Float64 => Some(8),
            ElementKind::Bool => Some(1),
            ElementKind::Str | ElementKind::Bytes => None,
        }
    }

    /// Whether `payload` is a well-formed encoding of this kind.
    pub fn accepts(&self, payload: &[u8]) -> bool {
        match self.payload_len() {
            Some(len) => payload.len() == len,
            None => true,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Int64 => "Int64",
            ElementKind::Uint64 => "Uint64",
            ElementKind::Float64 => "Float64",
            ElementKind::Str => "String",
            ElementKind::Bytes => "Bytes",
            ElementKind::Bool => "Bool",
        };
        f.write_str(name)
    }
}

/// Encode a signed 64-bit integer.
pub fn encode_int64(v: i64) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

/// Decode a signed 64-bit integer; truncated input decodes to zero.
pub fn decode_int64(b: &[u8]) -> i64 {
    match b.try_into() {
        Ok(arr) => i64::from_be_bytes(arr),
        Err(_) => 0,
    }
}

/// Encode an unsigned 64-bit integer.
pub fn encode_uint64(v: u64) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

/// Decode an unsigned 64-bit integer; truncated input decodes to zero.
pub fn decode_uint64(b: &[u8]) -> u64 {
    match b.try_into() {
        Ok(arr) => u64::from_be_bytes(arr),
        Err(_) => 0,
    }
}

/// Encode a 64-bit float as its IEEE-754 bits, big-endian.
pub fn encode_float64(v: f64) -> Vec<u8> {
    v.to_bits().to_be_bytes().to_vec()
}

/// Decode a 64-bit float; truncated input decodes to 0.0.
pub fn decode_float64(b: &[u8]) -> f64 {
    match b.try_into() {
        Ok(arr) => f64::from_bits(u64::from_be_bytes(arr)),
        Err(_) => 0.0,
    }
}

/// Encode a boolean as a single byte.
pub fn encode_bool(v: bool) -> Vec<u8> {
    vec![u8::from(v)]
}

/// Decode a boolean: empty input is false, otherwise non-zero is true.
pub fn decode_bool(b: &[u8]) -> bool {
    b.first().is_some_and(|&byte| byte != 0)
}
