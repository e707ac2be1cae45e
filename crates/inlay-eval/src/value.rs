//! Runtime values produced by expression evaluation.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// A runtime value in the expression language.
///
/// Numbers are always `f64`, like JavaScript. Arrays and objects exist as
/// runtime values but classify under the `Object` display kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// The undefined value (absent scope entries, missing members).
    Undefined,
    /// The null value.
    Null,
    /// A boolean value.
    Boolean(bool),
    /// A numeric value.
    Number(f64),
    /// A string value.
    String(String),
    /// An instant in time.
    Date(DateTime<Utc>),
    /// An array of values.
    Array(Vec<Value>),
    /// An object with string keys.
    Object(BTreeMap<String, Value>),
}

/// The display classification of a value.
///
/// A closed set of tags: every runtime value classifies into exactly one.
/// `Object` is the catch-all for structured values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Date,
    Object,
}

impl ValueKind {
    /// The tag name with the first letter upper-cased, for display.
    pub fn display_name(self) -> &'static str {
        match self {
            ValueKind::Undefined => "Undefined",
            ValueKind::Null => "Null",
            ValueKind::Boolean => "Boolean",
            ValueKind::Number => "Number",
            ValueKind::String => "String",
            ValueKind::Date => "Date",
            ValueKind::Object => "Object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Value {
    /// Classify this value into its display kind.
    ///
    /// Precedence follows the result model: null, undefined, then the
    /// primitive kinds, with `Object` as the catch-all for arrays and
    /// structured objects.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Undefined => ValueKind::Undefined,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Date(_) => ValueKind::Date,
            Value::Array(_) | Value::Object(_) => ValueKind::Object,
        }
    }

    /// Coerce this value to its string conversion (unquoted).
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_display_string).collect();
                parts.join(", ")
            }
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Coerce this value to a boolean.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) | Value::Object(_) | Value::Array(_) => true,
        }
    }

    /// Check if this value is null or undefined.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

/// Format the value the way a result popup displays it: strings, dates and
/// objects are quoted, primitives render bare.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => in_quotes(s),
        Value::Date(d) => in_quotes(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        other => in_quotes(&other.to_display_string()),
    }
}

fn in_quotes(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Canonical decimal rendering: integer-valued floats print without a
/// fractional part, non-finite values spell out NaN/Infinity.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
