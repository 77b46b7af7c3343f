//! Interpreters turn a token into fields.
//!
//! Each stage sees the bytes left over by the previous stage plus the fields
//! gathered so far. A stage either consumes its input, returning an empty
//! slice, or passes it through untouched. Stages never fail: input they do
//! not understand is left for the next stage, and [`LastChance`] at the end
//! of a [`Chain`] stores whatever is left.

mod defaults;
mod json;
mod key_value;
mod last_chance;
mod redis;

pub use defaults::DefaultFields;
pub use json::JsonInterpreter;
pub use key_value::KeyValueInterpreter;
pub use last_chance::LastChance;
pub use redis::RedisInterpreter;

use crate::value::Fields;

/// One field-extraction stage.
pub trait Interpreter: Send {
    /// Extracts what it can from `data` into `fields` and returns the bytes
    /// left for the next stage.
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8];
}

impl<I: Interpreter + ?Sized> Interpreter for Box<I> {
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8] {
        (**self).interpret(data, fields)
    }
}

/// Interpreters applied in order.
///
/// # Examples
///
/// ```
/// use streamsift::{Chain, DefaultFields, JsonInterpreter, LastChance, Value};
///
/// let chain = Chain::new()
///     .with(DefaultFields::new([("a", Value::from(1.0)), ("b", Value::from("x"))]))
///     .with(JsonInterpreter)
///     .with(LastChance::default());
///
/// let fields = chain.run(br#"{"b":"hi"}"#);
/// assert_eq!(fields["a"], Value::from(1.0));
/// assert_eq!(fields["b"], Value::from("hi"));
/// assert_eq!(fields.len(), 2);
/// ```
#[derive(Default)]
pub struct Chain {
    stages: Vec<Box<dyn Interpreter>>,
}

impl Chain {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain [`Filter::json`](crate::Filter::json) uses: JSON merge,
    /// then `Key: value` extraction from `_msg`, then a catch-all.
    #[must_use]
    pub fn json() -> Self {
        Self::new()
            .with(JsonInterpreter)
            .with(KeyValueInterpreter::tendermint())
            .with(LastChance::default())
    }

    /// Appends a stage.
    #[must_use]
    pub fn with(mut self, stage: impl Interpreter + 'static) -> Self {
        self.push(stage);
        self
    }

    /// Appends a stage in place.
    pub fn push(&mut self, stage: impl Interpreter + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage over `token`, starting from empty fields.
    #[must_use]
    pub fn run(&self, token: &[u8]) -> Fields {
        let mut fields = Fields::new();
        self.interpret(token, &mut fields);
        fields
    }
}

impl Interpreter for Chain {
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8] {
        self.stages
            .iter()
            .fold(data, |rest, stage| stage.interpret(rest, fields))
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("stages", &self.stages.len()).finish()
    }
}

impl<I: Interpreter + 'static> FromIterator<I> for Chain {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let mut chain = Self::new();
        for stage in iter {
            chain.push(stage);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn later_stages_override_earlier_ones() {
        let chain = Chain::new()
            .with(DefaultFields::new([("a", Value::from(1.0)), ("b", Value::from("x"))]))
            .with(JsonInterpreter)
            .with(LastChance::default());

        let mut fields = Fields::new();
        let rest = chain.interpret(br#"{"b":"hi"}"#, &mut fields);
        assert!(rest.is_empty());
        assert_eq!(
            fields,
            Fields::from([("a".into(), Value::from(1.0)), ("b".into(), Value::from("hi"))])
        );
    }

    #[test]
    fn defaults_after_json_win() {
        let chain = Chain::new()
            .with(JsonInterpreter)
            .with(DefaultFields::new([("b", Value::from("x"))]));
        let fields = chain.run(br#"{"b":"hi"}"#);
        assert_eq!(fields["b"], Value::from("x"));
    }

    #[test]
    fn leftovers_reach_last_chance() {
        let fields = Chain::json().run(b"not json");
        assert_eq!(fields, Fields::from([("_other".into(), Value::from("not json"))]));
    }

    #[test]
    fn empty_chain_passes_everything_through() {
        let chain = Chain::new();
        let mut fields = Fields::new();
        assert_eq!(chain.interpret(b"abc", &mut fields), b"abc");
        assert!(fields.is_empty());
    }

    #[test]
    fn collects_boxed_stages() {
        let stages: Vec<Box<dyn Interpreter>> =
            vec![Box::new(JsonInterpreter), Box::new(LastChance::default())];
        let chain: Chain = stages.into_iter().collect();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.run(br#"{"k":true}"#)["k"], Value::Boolean(true));
    }
}
