use bstr::ByteSlice;

use super::Interpreter;
use crate::value::{Fields, Value};

/// Stores any leftover bytes in the `_other` field so nothing is dropped.
///
/// Without an escaper the bytes are stored as text, with invalid UTF-8
/// replaced by U+FFFD. Meant to be the last stage of a
/// [`Chain`](super::Chain).
///
/// # Examples
///
/// ```
/// use streamsift::{Fields, Interpreter, LastChance, Value};
///
/// fn hex(data: &[u8]) -> String {
///     data.iter().map(|b| format!("{b:02x}")).collect()
/// }
///
/// let mut fields = Fields::new();
/// LastChance::with_escaper(hex).interpret(b"hi", &mut fields);
/// assert_eq!(fields["_other"], Value::from("6869"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LastChance {
    escaper: Option<fn(&[u8]) -> String>,
}

impl LastChance {
    /// Uses `escaper` to turn leftover bytes into the stored string.
    #[must_use]
    pub fn with_escaper(escaper: fn(&[u8]) -> String) -> Self {
        Self { escaper: Some(escaper) }
    }
}

impl Interpreter for LastChance {
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8] {
        if !data.is_empty() {
            let text = match self.escaper {
                Some(escape) => escape(data),
                None => data.to_str_lossy().into_owned(),
            };
            fields.insert("_other".into(), Value::String(text));
        }
        &[]
    }
}
