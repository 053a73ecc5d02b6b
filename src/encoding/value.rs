//! Dynamic value union
//!
//! Contexts that need dynamic typing (the interpreter, and Bytes stacks
//! used as tagged-union carriers) store a [`Value`] instead of a raw
//! payload. A value has a stable wire encoding: a 1-byte tag followed by a
//! kind-specific payload. Numeric and boolean payloads are fixed-width;
//! string and error payloads are length-prefixed with a big-endian u32.
//!
//! `Codeblock` and `Array` are in-memory only: they encode as `Nil` and do
//! not survive the wire.

use crate::encoding::{decode_float64, decode_int64, encode_float64, encode_int64};
use std::fmt;

/// Wire tag bytes. Stable; shared with the code generator.
const TAG_NIL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_STRING: u8 = 3;
const TAG_BOOL: u8 = 4;
const TAG_ERROR: u8 = 5;

/// A dynamically typed runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of a value
    Nil,
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Boolean
    Bool(bool),
    /// A first-class error message
    Error(String),
    /// Handle into the interpreter's code block table; in-memory only
    Codeblock(u64),
    /// Nested values; in-memory only
    Array(Vec<Value>),
}

impl Value {
    /// The value's type name as seen by Strata programs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Error(_) => "error",
            Value::Codeblock(_) => "codeblock",
            Value::Array(_) => "array",
        }
    }

    /// Truthiness under Strata conditionals.
    ///
    /// Nil, zero, the empty string, and errors are falsy; everything else
    /// is truthy. Arrays are truthy when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Error(_) => false,
            Value::Codeblock(_) => true,
            Value::Array(items) => !items.is_empty(),
        }
    }

    /// Encode to the stable wire format.
    ///
    /// `Codeblock` and `Array` have no wire representation and encode as
    /// `Nil`.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Nil | Value::Codeblock(_) | Value::Array(_) => vec![TAG_NIL],
            Value::Int(v) => {
                let mut buf = Vec::with_capacity(9);
                buf.push(TAG_INT);
                buf.extend_from_slice(&encode_int64(*v));
                buf
            }
            Value::Float(v) => {
                let mut buf = Vec::with_capacity(9);
                buf.push(TAG_FLOAT);
                buf.extend_from_slice(&encode_float64(*v));
                buf
            }
            Value::Str(s) => encode_tagged_bytes(TAG_STRING, s.as_bytes()),
            Value::Bool(b) => vec![TAG_BOOL, u8::from(*b)],
            Value::Error(msg) => encode_tagged_bytes(TAG_ERROR, msg.as_bytes()),
        }
    }

    /// Decode from the wire format.
    ///
    /// Total on all input: an unknown tag, a truncated payload, or invalid
    /// UTF-8 in a string payload decodes to `Nil`.
    pub fn from_bytes(b: &[u8]) -> Value {
        let Some((&tag, payload)) = b.split_first() else {
            return Value::Nil;
        };
        match tag {
            TAG_NIL => Value::Nil,
            TAG_INT if payload.len() == 8 => Value::Int(decode_int64(payload)),
            TAG_FLOAT if payload.len() == 8 => Value::Float(decode_float64(payload)),
            TAG_STRING => match decode_length_prefixed(payload) {
                Some(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(s) => Value::Str(s),
                    Err(_) => Value::Nil,
                },
                None => Value::Nil,
            },
            TAG_BOOL if payload.len() == 1 => Value::Bool(payload[0] != 0),
            TAG_ERROR => match decode_length_prefixed(payload) {
                Some(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(s) => Value::Error(s),
                    Err(_) => Value::Nil,
                },
                None => Value::Nil,
            },
            _ => Value::Nil,
        }
    }
}

fn encode_tagged_bytes(tag: u8, bytes: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(5 + bytes.len());
    buf.push(tag);
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
    buf
}

fn decode_length_prefixed(payload: &[u8]) -> Option<&[u8]> {
    let len_bytes: [u8; 4] = payload.get(..4)?.try_into().ok()?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    let bytes = payload.get(4..4 + len)?;
    // Trailing garbage means a corrupt frame, not a short read.
    (payload.len() == 4 + len).then_some(bytes)
}

impl PartialEq for Value {
    /// Structural equality. Floats compare by bit pattern so that NaN
    /// survives an encode/decode round trip as an equal value.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Codeblock(a), Value::Codeblock(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Error(msg) => write!(f, "error: {msg}"),
            Value::Codeblock(id) => write!(f, "<codeblock {id}>"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}
