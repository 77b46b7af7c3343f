use std::sync::LazyLock;

use bstr::ByteSlice;
use chrono::{NaiveDateTime, Timelike};
use regex::Regex;

use super::Interpreter;
use crate::value::{Fields, Value};

// pid:role timestamp level message
static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+):([XCSM]) ([0-9]+ [A-Za-z]+ [0-9]+ [0-9:.]+) ([.*#-]) (.*)$")
        .expect("invalid redis log pattern")
});

// Two-digit day, four-digit year, exactly three fractional digits.
static TIMESTAMP_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2} [A-Za-z]{3} [0-9]{4} [0-9]{1,2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}$")
        .expect("invalid redis timestamp pattern")
});

const TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M:%S%.3f";

/// Parses redis server log lines.
///
/// A line such as `66940:C 18 Apr 2019 15:18:28.565 # Configuration loaded`
/// becomes the fields `pid`, `role`, `timestamp`, `level` and `msg`. The
/// timestamp is rewritten as RFC 3339 in UTC without trailing fractional
/// zeros, or kept verbatim unless it has the exact `02 Jan 2006 15:04:05.000`
/// layout. Redis has no error level, so verbose (`-`) and debug (`.`) both map
/// to `debug`, notice (`*`) to `info` and warning (`#`) to `warn`.
///
/// Lines that do not look like redis output are stored in `_txt`; blank input
/// adds nothing. The input is always consumed.
///
/// # Examples
///
/// ```
/// use streamsift::{Fields, Interpreter, RedisInterpreter, Value};
///
/// let mut fields = Fields::new();
/// RedisInterpreter.interpret(b"66940:C 18 Apr 2019 15:18:28.565 # Configuration loaded", &mut fields);
/// assert_eq!(fields["role"], Value::from("child"));
/// assert_eq!(fields["timestamp"], Value::from("2019-04-18T15:18:28.565Z"));
/// assert_eq!(fields["level"], Value::from("warn"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisInterpreter;

fn role(code: &str) -> &'static str {
    match code {
        "X" => "sentinel",
        "C" => "child",
        "S" => "slave",
        _ => "master",
    }
}

fn level(code: &str) -> &'static str {
    match code {
        "*" => "info",
        "#" => "warn",
        _ => "debug",
    }
}

fn timestamp(raw: &str) -> String {
    if !TIMESTAMP_SHAPE.is_match(raw) {
        return raw.to_owned();
    }
    match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        Ok(t) => rfc3339_nano(&t),
        Err(_) => raw.to_owned(),
    }
}

/// RFC 3339 in UTC with trailing zeros of the fraction dropped, so
/// `28.560` becomes `28.56Z` and `05.000` becomes `05Z`.
fn rfc3339_nano(t: &NaiveDateTime) -> String {
    let mut out = t.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = t.nanosecond();
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

impl Interpreter for RedisInterpreter {
    fn interpret<'a>(&self, data: &'a [u8], fields: &mut Fields) -> &'a [u8] {
        let text = data.to_str_lossy();
        let line = text.trim();
        if line.is_empty() {
            return &[];
        }
        let Some(caps) = LOG_LINE.captures(line) else {
            fields.insert("_txt".into(), Value::from(line));
            return &[];
        };
        fields.insert("pid".into(), Value::from(&caps[1]));
        fields.insert("role".into(), Value::from(role(&caps[2])));
        fields.insert("timestamp".into(), Value::from(timestamp(&caps[3])));
        fields.insert("level".into(), Value::from(level(&caps[4])));
        fields.insert("msg".into(), Value::from(&caps[5]));
        &[]
    }
}
