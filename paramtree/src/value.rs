//! Typed values held by simple [crate::tree::Parameter]s.

use serde::{Deserialize, Serialize};

/// A single value held in a simple parameter's `save` sequence.
///
/// Values cross the submission boundary as JSON. [Value::NotANumber] has no JSON form and is
/// written as `null`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Result of converting non-numeric input for a numeric binding.
    NotANumber,
    Text(String),
    /// Structured reference (style, user, service, data, ...) or any other JSON array/object.
    Reference(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for [Value::Integer] and [Value::Float].
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// True for everything except [Value::Reference].
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Reference(_))
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Equality that treats integers and floats of the same magnitude as equal, as enumeration
    /// members and saved values may have been converted differently.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.clone().into()
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::NotANumber),
            },
            Json::String(s) => Value::Text(s),
            other @ (Json::Array(_) | Json::Object(_)) => Value::Reference(other),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Value::Null | Value::NotANumber => Json::Null,
            Value::Bool(b) => Json::Bool(b),
            Value::Integer(i) => Json::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Text(s) => Json::String(s),
            Value::Reference(r) => r,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::NotANumber => write!(f, "NaN"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Reference(r) => write!(f, "{r}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;

    #[gtest]
    fn test_json_numbers_keep_their_kind() {
        expect_that!(Value::from(json!(5)), eq(&Value::Integer(5)));
        expect_that!(Value::from(json!(2.5)), eq(&Value::Float(2.5)));
        expect_that!(Value::from(json!(5.0)).to_json(), eq(&json!(5.0)));
    }

    #[gtest]
    fn test_not_a_number_serializes_as_null() {
        expect_that!(Value::NotANumber.to_json(), eq(&json!(null)));
    }

    #[gtest]
    fn test_structured_values_are_references() {
        let style = json!({"id": 3, "name": "default-point"});
        let value = Value::from(style.clone());
        expect_that!(value.is_primitive(), is_false());
        expect_that!(value.to_json(), eq(&style));
    }

    #[gtest]
    fn test_loose_eq_across_number_kinds() {
        expect_that!(Value::Integer(5).loose_eq(&Value::Float(5.0)), is_true());
        expect_that!(Value::Integer(5).loose_eq(&Value::Text("5".into())), is_false());
        expect_that!(Value::from("a").loose_eq(&Value::from("a")), is_true());
    }
}
