use super::Interpreter;
use crate::value::{Fields, Value};

/// Writes a fixed set of fields, overwriting existing keys, and passes the
/// input through.
///
/// Its position in a [`Chain`](super::Chain) decides precedence: placed first
/// it supplies defaults that later stages may override, placed last it forces
/// values.
#[derive(Debug, Clone, Default)]
pub struct DefaultFields {
    fields: Fields,
}

impl DefaultFields {
    /// Creates the stage from key/value pairs.
    pub fn new<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<Fields> for DefaultFields {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

impl Interpreter for DefaultFields {
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8] {
        fields.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> DefaultFields {
        DefaultFields::new([("a", Value::from(1.0)), ("b", Value::from("buzz"))])
    }

    #[test]
    fn adds_to_empty() {
        let mut fields = Fields::new();
        assert_eq!(stage().interpret(b"hi", &mut fields), b"hi");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["a"], Value::from(1.0));
    }

    #[test]
    fn keeps_unrelated_fields() {
        let mut fields = Fields::from([("c".into(), Value::from("hello"))]);
        stage().interpret(b"hi", &mut fields);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["c"], Value::from("hello"));
    }

    #[test]
    fn overrides_existing() {
        let mut fields = Fields::from([("a".into(), Value::from("hello"))]);
        assert_eq!(stage().interpret(b"whee", &mut fields).len(), 4);
        assert_eq!(fields["a"], Value::from(1.0));
        assert_eq!(fields["b"], Value::from("buzz"));
    }
}
