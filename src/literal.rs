//! Literal decoding
//!
//! Turns the encoded lexical form of a literal into a typed scalar. Numeric
//! payloads are read the lenient way: the longest numeric prefix counts and a
//! payload without one decodes to NaN.

use crate::term::split_encoded;
use crate::vocab::Datatype;
use serde::Serialize;
use thiserror::Error;

/// Literal decoding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    /// Datatype has no decoding rule
    #[error("cannot read {0} literal")]
    UnsupportedDatatype(String),

    /// hexBinary payload is not valid hex
    #[error("invalid hexBinary literal: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

pub type LiteralResult<T> = Result<T, LiteralError>;

/// Decoded literal value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    /// Floating point; also the NaN result of an unreadable integer
    Number(f64),
    Bytes(Vec<u8>),
}

impl LiteralValue {
    /// Get string value if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LiteralValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LiteralValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of integers and numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LiteralValue::Integer(i) => Some(*i as f64),
            LiteralValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get bytes if this is a hexBinary value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            LiteralValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// JSON form; bytes become lowercase hex and non-finite numbers `null`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            LiteralValue::String(s) => serde_json::Value::String(s.clone()),
            LiteralValue::Boolean(b) => serde_json::Value::Bool(*b),
            LiteralValue::Integer(i) => serde_json::Value::from(*i),
            LiteralValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            LiteralValue::Bytes(b) => serde_json::Value::String(hex::encode(b)),
        }
    }
}

/// Decode an encoded literal.
///
/// Returns `Ok(None)` when the text does not start with a quote.
pub fn decode(encoded: &str) -> LiteralResult<Option<LiteralValue>> {
    let Some((payload, suffix)) = split_encoded(encoded) else {
        return Ok(None);
    };
    // the suffix opens with a two-character marker, `^^` for typed literals
    let datatype = suffix.char_indices().nth(2).map_or("", |(at, _)| &suffix[at..]);

    if datatype.is_empty() {
        return Ok(Some(LiteralValue::String(payload.to_string())));
    }

    let value = match Datatype::from_iri(datatype) {
        Some(Datatype::Boolean) => LiteralValue::Boolean(payload == "true"),
        Some(Datatype::Integer) => parse_integer(payload),
        Some(Datatype::Decimal) | Some(Datatype::Double) => LiteralValue::Number(parse_float(payload)),
        Some(Datatype::HexBinary) => LiteralValue::Bytes(hex::decode(payload)?),
        None => return Err(LiteralError::UnsupportedDatatype(datatype.to_string())),
    };

    Ok(Some(value))
}

/// Leading base-10 integer, falling back to a float when it overflows `i64`.
fn parse_integer(text: &str) -> LiteralValue {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['+', '-']));
    let digits_len = text[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits_len == 0 {
        return LiteralValue::Number(f64::NAN);
    }

    let prefix = &text[..digits_start + digits_len];
    match prefix.parse::<i64>() {
        Ok(i) => LiteralValue::Integer(i),
        Err(_) => LiteralValue::Number(prefix.parse::<f64>().unwrap_or(f64::NAN)),
    }
}

/// Longest leading floating-point number, or NaN.
fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(text.starts_with(['+', '-']));

    if text[end..].starts_with("Infinity") {
        return if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let count_digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let int_digits = count_digits(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+') | Some(b'-')));
        let exp_digits = count_digits(end + 1 + sign);
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }

    text[..end].parse::<f64>().unwrap_or(f64::NAN)
}
