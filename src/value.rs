use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::num::number::{format_f64, is_json_number};
use crate::text::string::write_quoted;
use crate::{Error, Result};

/// Ordered object map; keys keep the position of their first insertion.
pub type Map = IndexMap<String, Value>;

/// A JSON number kept as its validated literal text.
///
/// Conversion to a concrete width happens only once the target kind is known,
/// so no precision is lost in between. Equality compares literals: `1` and
/// `1.0` are different numbers here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Number {
    literal: SmolStr,
}

impl Number {
    pub(crate) fn from_validated(literal: &str) -> Self {
        Self {
            literal: SmolStr::new(literal),
        }
    }

    /// Returns `None` when `literal` is not a JSON number.
    pub fn parse(literal: &str) -> Option<Self> {
        is_json_number(literal).then(|| Self::from_validated(literal))
    }

    pub fn from_f64(value: f64) -> Option<Self> {
        value
            .is_finite()
            .then(|| Self::from_validated(&format_f64(value)))
    }

    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// True when the literal has neither fraction nor exponent.
    pub fn is_integer(&self) -> bool {
        !self
            .literal
            .bytes()
            .any(|b| matches!(b, b'.' | b'e' | b'E'))
    }

    pub fn as_i64(&self) -> Option<i64> {
        if self.is_integer() {
            self.literal.parse().ok()
        } else {
            None
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        if self.is_integer() {
            self.literal.parse().ok()
        } else {
            None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.literal.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        let mut buffer = itoa::Buffer::new();
        Self::from_validated(buffer.format(n))
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        let mut buffer = itoa::Buffer::new();
        Self::from_validated(buffer.format(n))
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::from(n as i64)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::from(n as u64)
    }
}

/// Immutable JSON parse tree.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Number(n) => out.push_str(n.as_str()),
            Value::String(s) => write_quoted(out, s),
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_compact(out);
                }
                out.push(']');
            }
            Value::Object(map) => {
                out.push('{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_quoted(out, key);
                    out.push(':');
                    value.write_compact(out);
                }
                out.push('}');
            }
        }
    }
}

/// Compact JSON text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_compact(&mut out);
        f.write_str(&out)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(Number::from_validated(&n.to_string())),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Fails on numbers serde_json cannot hold, such as `1e400`, instead of
/// changing them.
impl TryFrom<&Value> for serde_json::Value {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::from_str::<serde_json::Number>(n.as_str())
                .map(serde_json::Value::Number)
                .map_err(|_| Error::out_of_range("serde_json number", n.as_str()))?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        serde_json::Value::try_from(item).map_err(|err| err.at_index(idx))
                    })
                    .collect::<Result<_>>()?,
            ),
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| -> Result<(String, serde_json::Value)> {
                        Ok((key.clone(), serde_json::Value::try_from(value)?))
                    })
                    .collect::<Result<_>>()?,
            ),
        })
    }
}
