//! Parsed option and argument values.
//!
//! Every token the parser accepts ends up as a [`Value`]: flags become
//! [`Value::Bool`], single-token options and arguments become [`Value::Str`],
//! and anything taking several tokens (or accumulating across repeated
//! occurrences) becomes a [`Value::List`]. Values serialize untagged, so a
//! [`ParsedValues`] renders as plain JSON objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A single parsed value.
///
/// # Examples
///
/// ```
/// use cmdtree_core::Value;
///
/// let tags = Value::strings(["a", "b"]);
/// assert_eq!(tags.as_list().map(|items| items.len()), Some(2));
/// assert_eq!(Value::from("x").as_str(), Some("x"));
/// assert!(Value::Bool(true).truthy());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Flag state.
    Bool(bool),
    /// A single token.
    Str(String),
    /// Several tokens, or accumulated occurrences of a multiple option.
    List(Vec<Value>),
}

impl Value {
    /// Builds a list of string values.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }

    /// Returns an empty list.
    pub fn empty_list() -> Self {
        Value::List(Vec::new())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Boolean coercion used for flag defaults: only `false` is falsy.
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    /// Flattens the value into its string tokens, in order.
    ///
    /// Booleans render as `true`/`false`.
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Value::Bool(b) => vec![b.to_string()],
            Value::Str(s) => vec![s.clone()],
            Value::List(items) => items.iter().flat_map(Value::to_strings).collect(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

// Manifests written by hand carry numeric defaults (`default: 3`); those are
// kept as the token the user would have typed.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<RawValue>),
}

impl From<RawValue> for Value {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Bool(b) => Value::Bool(b),
            RawValue::Int(n) => Value::Str(n.to_string()),
            RawValue::Float(f) => Value::Str(f.to_string()),
            RawValue::Str(s) => Value::Str(s),
            RawValue::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawValue::deserialize(deserializer).map(Value::from)
    }
}

/// Owned result of a completed parse.
///
/// Option values are keyed by descriptor name; options without a value and
/// without a default are absent. Argument values are keyed by argument name.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{ParsedValues, Value};
///
/// let mut values = ParsedValues::default();
/// values.options.insert("verbose".into(), Value::Bool(true));
/// values.arguments.insert("file".into(), Value::from("a.txt"));
///
/// assert!(values.flag("verbose"));
/// assert_eq!(values.argument_str("file"), Some("a.txt"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedValues {
    /// Option values by descriptor name.
    pub options: BTreeMap<String, Value>,
    /// Positional argument values by argument name.
    pub arguments: BTreeMap<String, Value>,
}

impl ParsedValues {
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// Returns the flag state, `false` when the option is absent or not a flag.
    pub fn flag(&self, name: &str) -> bool {
        self.option(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(Value::as_str)
    }

    pub fn argument_str(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(Value::as_str)
    }

    /// Returns `true` when neither options nor arguments carry anything.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.arguments.is_empty()
    }
}
