//! Coercion of raw descriptor values (defaults, enumeration members) into typed [Value]s.
//!
//! Conversion never fails. Numeric bindings follow the lenient prefix parsing that process
//! descriptors have always been read with: trailing garbage is ignored and input without any
//! leading number becomes [Value::NotANumber].

use crate::{
    binding::{Binding, BindingKind},
    value::Value,
};

/// Converts `raw` according to `binding`.
pub fn convert(raw: &serde_json::Value, binding: &Binding) -> Value {
    convert_kind(raw, binding.kind())
}

/// Converts `raw` according to a [BindingKind].
pub fn convert_kind(raw: &serde_json::Value, kind: BindingKind) -> Value {
    use serde_json::Value as Json;
    match kind {
        BindingKind::Integer => match raw {
            Json::Null => Value::Null,
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n
                    .as_f64()
                    .map(|f| integer_from_f64(f.trunc()))
                    .unwrap_or(Value::NotANumber),
            },
            Json::String(s) => parse_int(s),
            _ => Value::NotANumber,
        },
        BindingKind::Float => match raw {
            Json::Null => Value::Null,
            Json::Number(n) => n.as_f64().map(Value::Float).unwrap_or(Value::NotANumber),
            Json::String(s) => parse_float(s),
            _ => Value::NotANumber,
        },
        BindingKind::Boolean => Value::Bool(truthy(raw)),
        BindingKind::File | BindingKind::Opaque => Value::from(raw.clone()),
    }
}

/// Parses the leading integer of `s`: optional whitespace, optional sign, optional `0x` prefix,
/// then digits up to the first character that is not one.
pub fn parse_int(s: &str) -> Value {
    let s = s.trim_start();
    let (negative, s) = split_sign(s);
    let (radix, s) = match s.get(..2) {
        Some("0x") | Some("0X") => (16, &s[2..]),
        _ => (10, s),
    };
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let digits = &s[..end];
    if digits.is_empty() {
        return Value::NotANumber;
    }
    match i64::from_str_radix(digits, radix) {
        Ok(i) => Value::Integer(if negative { -i } else { i }),
        // Too large for i64: keep the magnitude as a float.
        Err(_) => match digits.parse::<f64>() {
            Ok(f) if radix == 10 => Value::Float(if negative { -f } else { f }),
            _ => Value::NotANumber,
        },
    }
}

/// Parses the longest leading decimal floating point literal of `s`.
pub fn parse_float(s: &str) -> Value {
    let s = s.trim_start();
    let (negative, rest) = split_sign(s);
    if rest.starts_with("Infinity") {
        return Value::Float(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let bytes = rest.as_bytes();
    let mut end = 0;
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return Value::NotANumber;
    }
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    match rest[..end].parse::<f64>() {
        Ok(f) => Value::Float(if negative { -f } else { f }),
        Err(_) => Value::NotANumber,
    }
}

/// Truthiness of a raw JSON value.
pub fn truthy(raw: &serde_json::Value) -> bool {
    use serde_json::Value as Json;
    match raw {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn integer_from_f64(f: f64) -> Value {
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::Integer(f as i64)
    } else {
        Value::Float(f)
    }
}
