//! Field values and JSON string escaping.
//!
//! Interpreters accumulate [`Fields`] for each record. A field holds a
//! [`Value`], a closed variant that mirrors the JSON data model, so records
//! can be printed or serialized without any dynamic typing.
use std::{collections::BTreeMap, fmt};

use bstr::ByteSlice;

/// The field mapping built for each record.
pub type Fields = BTreeMap<String, Value>;

/// A field value, shaped like a JSON value as defined by [RFC 8259].
///
/// # Examples
///
/// ```
/// use streamsift::{Fields, Value};
///
/// let mut fields = Fields::new();
/// fields.insert("msg".to_string(), Value::from("started"));
/// fields.insert("height".to_string(), Value::from(12.0));
/// let v = Value::Object(fields);
/// assert_eq!(v.to_string(), r#"{"height":12,"msg":"started"}"#);
/// ```
///
/// [RFC 8259]: https://datatracker.ietf.org/doc/html/rfc8259
// Serde support is compiled in for tests and when the optional `serde` feature
// is enabled. Untagged, so a record serializes as the JSON it represents.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(test, feature = "serde"), serde(untagged))]
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// `null`.
    #[default]
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// Every number, integers included.
    Number(f64),
    /// A string.
    String(String),
    /// An array.
    Array(Vec<Value>),
    /// An object with sorted keys.
    Object(Fields),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Fields> for Value {
    fn from(v: Fields) -> Self {
        Self::Object(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl Value {
    /// Returns the string slice if the value is a [`String`](Value::String).
    ///
    /// # Examples
    ///
    /// ```
    /// use streamsift::Value;
    ///
    /// assert_eq!(Value::from("x").as_str(), Some("x"));
    /// assert_eq!(Value::Null.as_str(), None);
    /// ```
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if the value is a [`Number`](Value::Number).
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns `true` if the value is [`Null`](Value::Null).
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Escapes a string for inclusion in a JSON string literal.
///
/// Quotes and backslashes are escaped, `\n`, `\r` and `\t` use their short
/// forms, and other control characters and the Unicode line separators are
/// written as `\uXXXX`.
pub(crate) fn write_escaped_string<W: fmt::Write>(src: &str, f: &mut W) -> fmt::Result {
    for c in src.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            // Pre-2019 JSON parsers choke on raw line separators.
            '\u{2028}' | '\u{2029}' => write!(f, "\\u{:04X}", c as u32)?,
            // JSON escapes carry exactly 4 hex digits, so only BMP controls
            // are escaped here.
            c if c.is_ascii_control() || (c.is_control() && c as u32 <= 0xFFFF) => {
                write!(f, "\\u{:04X}", c as u32)?;
            }
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Escapes `src` into the contents of a JSON string literal.
#[must_use]
pub fn escape_string(src: &str) -> String {
    let mut result = String::with_capacity(src.len() + 2);
    // Writing into a String cannot fail.
    let _ = write_escaped_string(src, &mut result);
    result
}

/// Escapes arbitrary bytes into the contents of a JSON string literal.
///
/// Invalid UTF-8 sequences become U+FFFD.
///
/// # Examples
///
/// ```
/// use streamsift::escape_bytes;
///
/// assert_eq!(escape_bytes(b"say \"hi\"\n"), r#"say \"hi\"\n"#);
/// assert_eq!(escape_bytes(b"\xffok"), "\u{FFFD}ok");
/// ```
#[must_use]
pub fn escape_bytes(src: &[u8]) -> String {
    escape_string(&src.to_str_lossy())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            // JSON has no spelling for NaN or the infinities.
            Value::Number(n) if !n.is_finite() => f.write_str("null"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => {
                f.write_str("\"")?;
                write_escaped_string(s, f)?;
                f.write_str("\"")
            }
            Value::Array(arr) => {
                f.write_str("[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Object(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str("\"")?;
                    write_escaped_string(k, f)?;
                    write!(f, "\":{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
