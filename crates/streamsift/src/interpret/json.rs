use tracing::trace;

use super::Interpreter;
use crate::value::{Fields, Value};

/// Parses the input as a JSON object and merges its keys into the fields.
///
/// Anything that is not a JSON object, including valid JSON of another type,
/// is passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonInterpreter;

impl Interpreter for JsonInterpreter {
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8] {
        match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(data) {
            Ok(object) => {
                fields.extend(object.into_iter().map(|(k, v)| (k, Value::from(v))));
                &[]
            }
            Err(err) => {
                trace!(error = %err, len = data.len(), "passing through non-JSON token");
                data
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn fields<const N: usize>(pairs: [(&str, &str); N]) -> Fields {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), Value::from(v))).collect()
    }

    #[rstest]
    #[case::not_json_at_all("hi", fields([("a", "hi")]), 2, fields([("a", "hi")]))]
    #[case::not_an_object(r#""hi""#, fields([("c", "abc")]), 4, fields([("c", "abc")]))]
    #[case::empty_object("{}", fields([("a", "abc")]), 0, fields([("a", "abc")]))]
    #[case::simple(r#"{"b":"hi"}"#, fields([("a", "abc")]), 0, fields([("a", "abc"), ("b", "hi")]))]
    #[case::several(
        r#"{"b":"hi", "msg":"lots of things"}"#,
        fields([("a", "abc")]),
        0,
        fields([("a", "abc"), ("b", "hi"), ("msg", "lots of things")])
    )]
    #[case::overrides(r#"{"a":"new"}"#, fields([("a", "old")]), 0, fields([("a", "new")]))]
    fn merges(
        #[case] input: &str,
        #[case] start: Fields,
        #[case] rest: usize,
        #[case] want: Fields,
    ) {
        let mut start = start;
        let left = JsonInterpreter.interpret(input.as_bytes(), &mut start);
        assert_eq!(left.len(), rest);
        assert_eq!(start, want);
    }

    #[test]
    fn keeps_value_types() {
        let mut got = Fields::new();
        let input = br#"{"n":2,"f":1.5,"b":false,"z":null,"l":[1],"o":{"k":"v"}}"#;
        JsonInterpreter.interpret(input, &mut got);
        assert_eq!(got["n"], Value::Number(2.0));
        assert_eq!(got["f"], Value::Number(1.5));
        assert_eq!(got["b"], Value::Boolean(false));
        assert!(got["z"].is_null());
        assert_eq!(got["l"], Value::Array(vec![Value::Number(1.0)]));
        assert_eq!(got["o"], Value::Object(fields([("k", "v")])));
    }
}
