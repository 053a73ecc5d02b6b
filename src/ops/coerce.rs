//! Cross-kind payload coercion
//!
//! The conversion table [`bring`](crate::stack::Stack::bring) applies when
//! source and destination kinds differ. Conversions are total functions of
//! the payload bytes plus an optional numeric base; anything outside the
//! table is an error, and a failed conversion leaves the transfer
//! untouched.
//!
//! Bytes-to-numeric conversions reinterpret the canonical encoding
//! directly (no parsing); a payload of the wrong width is an error rather
//! than being zero-filled.

use crate::encoding::{
    decode_bool, decode_float64, decode_int64, decode_uint64, encode_bool, encode_float64,
    encode_int64, encode_uint64, ElementKind,
};
use crate::error::{RuntimeResult, StackError};

/// Default base for integer formatting and parsing.
const DEFAULT_BASE: u32 = 10;

/// Convert `payload` from `from`-kind bytes to `to`-kind bytes.
///
/// `base` overrides the numeric base for Int64↔String conversions.
pub(crate) fn coerce(
    payload: &[u8],
    from: ElementKind,
    to: ElementKind,
    base: Option<u32>,
) -> RuntimeResult<Vec<u8>> {
    use ElementKind::*;

    if from == to {
        return Ok(payload.to_vec());
    }
    let base = match base {
        Some(b) if (2..=36).contains(&b) => b,
        Some(b) => {
            return Err(StackError::coercion(from, to, format!("invalid base {b}")));
        }
        None => DEFAULT_BASE,
    };

    match (from, to) {
        // Int64 sources
        (Int64, Uint64) => Ok(payload.to_vec()),
        (Int64, Float64) => Ok(encode_float64(decode_int64(payload) as f64)),
        (Int64, Str) => Ok(format_int(decode_int64(payload), base).into_bytes()),
        (Int64, Bytes) => Ok(payload.to_vec()),
        (Int64, Bool) => Ok(encode_bool(decode_int64(payload) != 0)),

        // Float64 sources
        (Float64, Int64) => Ok(encode_int64(decode_float64(payload) as i64)),
        (Float64, Uint64) => Ok(encode_uint64(decode_float64(payload) as u64)),
        (Float64, Str) => Ok(decode_float64(payload).to_string().into_bytes()),
        (Float64, Bytes) => Ok(payload.to_vec()),
        (Float64, Bool) => Ok(encode_bool(decode_float64(payload) != 0.0)),

        // String sources
        (Str, Int64) => {
            let text = utf8(payload, from, to)?;
            i64::from_str_radix(text.trim(), base)
                .map(encode_int64)
                .map_err(|e| StackError::coercion(from, to, e.to_string()))
        }
        (Str, Uint64) => {
            let text = utf8(payload, from, to)?;
            u64::from_str_radix(text.trim(), base)
                .map(encode_uint64)
                .map_err(|e| StackError::coercion(from, to, e.to_string()))
        }
        (Str, Float64) => {
            let text = utf8(payload, from, to)?;
            text.trim()
                .parse::<f64>()
                .map(encode_float64)
                .map_err(|e| StackError::coercion(from, to, e.to_string()))
        }
        (Str, Bytes) => Ok(payload.to_vec()),
        (Str, Bool) => {
            let text = utf8(payload, from, to)?;
            match text.trim() {
                "true" | "1" => Ok(encode_bool(true)),
                "false" | "0" | "" => Ok(encode_bool(false)),
                other => Err(StackError::coercion(
                    from,
                    to,
                    format!("not a boolean: {other:?}"),
                )),
            }
        }

        // Bytes sources: reinterpret the canonical encoding
        (Bytes, Int64) | (Bytes, Uint64) | (Bytes, Float64) => {
            if payload.len() == 8 {
                Ok(payload.to_vec())
            } else {
                Err(StackError::coercion(
                    from,
                    to,
                    format!("need 8 bytes, have {}", payload.len()),
                ))
            }
        }
        (Bytes, Str) => Ok(payload.to_vec()),
        (Bytes, Bool) => Ok(encode_bool(!matches!(payload, [] | [0]))),

        // Bool sources
        (Bool, Int64) => Ok(encode_int64(i64::from(decode_bool(payload)))),
        (Bool, Uint64) => Ok(encode_uint64(u64::from(decode_bool(payload)))),
        (Bool, Float64) => Ok(encode_float64(f64::from(u8::from(decode_bool(payload))))),
        (Bool, Str) => Ok(decode_bool(payload).to_string().into_bytes()),
        (Bool, Bytes) => Ok(payload.to_vec()),

        // Everything else, Uint64 sources included, is outside the table.
        _ => Err(StackError::coercion(from, to, "unsupported conversion")),
    }
}

fn utf8<'a>(payload: &'a [u8], from: ElementKind, to: ElementKind) -> RuntimeResult<&'a str> {
    std::str::from_utf8(payload).map_err(|_| StackError::coercion(from, to, "invalid UTF-8"))
}

/// Format an integer in the given base, lowercase digits, `-` prefix for
/// negatives.
fn format_int(value: i64, base: u32) -> String {
    if base == 10 {
        return value.to_string();
    }
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut magnitude = value.unsigned_abs();
    let mut buf = Vec::new();
    loop {
        buf.push(DIGITS[(magnitude % u64::from(base)) as usize]);
        magnitude /= u64::from(base);
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        buf.push(b'-');
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}
