use std::sync::LazyLock;

use regex::Regex;

use super::Interpreter;
use crate::value::{Fields, Value};

// A `Key: value` line, unless the value opens a block.
static KEY_VALUE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Za-z0-9]+):[ \t]*(.*[^{])$").expect("invalid key/value pattern")
});

// A newline with the blanks around it.
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("invalid line break pattern"));

/// Extracts `Key: value` lines embedded in string fields.
///
/// Some programs log a multi-line dump as one message. For every configured
/// key holding a string, each line shaped like `Key: value` (key starting
/// with an uppercase letter, value not ending in `{`) becomes its own field.
/// Values that parse as integers are stored as numbers. The input bytes are
/// passed through.
#[derive(Debug, Clone, Default)]
pub struct KeyValueInterpreter {
    keys: Vec<String>,
}

impl KeyValueInterpreter {
    /// Looks inside the given fields.
    pub fn new<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Looks inside `_msg`, where wrapped text and tendermint block dumps end
    /// up.
    #[must_use]
    pub fn tendermint() -> Self {
        Self::new(["_msg"])
    }
}

#[allow(clippy::cast_precision_loss)]
fn extract(text: &str, fields: &mut Fields) {
    for line in LINE_BREAK.split(text) {
        let Some(caps) = KEY_VALUE_LINE.captures(line) else {
            continue;
        };
        let value = &caps[2];
        let value = match value.parse::<i64>() {
            Ok(n) => Value::Number(n as f64),
            Err(_) => Value::from(value),
        };
        fields.insert(caps[1].to_owned(), value);
    }
}

impl Interpreter for KeyValueInterpreter {
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8] {
        for key in &self.keys {
            if let Some(Value::String(text)) = fields.get(key) {
                let text = text.clone();
                extract(&text, fields);
            }
        }
        data
    }
}
