use std::{borrow::Cow, sync::LazyLock};

use bstr::ByteSlice;
use regex::bytes::Regex;

use super::SplitResult;
use crate::value::escape_bytes;

/// Distance from a record start after which an unclosed object is cut off and
/// wrapped as text.
pub const MAX_OBJECT_LENGTH: usize = 3000;

static RECORD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{[[:space:]]*""#).expect("invalid record start pattern"));

/// Wraps arbitrary bytes as a one-field JSON object, `{"_msg": "<text>"}`.
///
/// # Examples
///
/// ```
/// use streamsift::wrap_message;
///
/// assert_eq!(wrap_message(b"say \"hi\""), br#"{"_msg": "say \"hi\""}"#);
/// ```
#[must_use]
pub fn wrap_message(text: &[u8]) -> Vec<u8> {
    format!(r#"{{"_msg": "{}"}}"#, escape_bytes(text)).into_bytes()
}

fn wrapped(advance: usize, text: &[u8]) -> SplitResult<'_> {
    Ok((advance, Some(Cow::Owned(wrap_message(text)))))
}

/// Splits a stream of JSON objects interleaved with arbitrary text.
///
/// A record starts at `{` followed by optional whitespace and `"`, and ends
/// at the matching `}`; braces and quotes inside string literals (including
/// backslash escapes) are skipped. Text that is not part of a record is
/// returned wrapped by [`wrap_message`], so every token is a single JSON
/// object:
///
/// - non-blank text before a record start is trimmed and wrapped;
/// - an object still open at end of stream is wrapped whole;
/// - an open object followed by another record start is abandoned and
///   everything before the second start is wrapped;
/// - an open object with no second start that already spans more than
///   [`MAX_OBJECT_LENGTH`] bytes is cut at that length and wrapped.
///
/// The function never returns an error.
///
/// # Examples
///
/// ```
/// use streamsift::json_split;
///
/// let (advance, token) = json_split(br#"  {"a":1} tail"#, false).unwrap();
/// assert_eq!(advance, 9);
/// assert_eq!(token.as_deref(), Some(&br#"{"a":1}"#[..]));
/// ```
pub fn json_split(data: &[u8], at_eof: bool) -> SplitResult<'_> {
    if at_eof && data.is_empty() {
        return Ok((0, None));
    }

    let Some(first) = RECORD_START.find(data) else {
        if at_eof {
            let rest = data.trim();
            if !rest.is_empty() {
                return wrapped(data.len(), rest);
            }
            return Ok((data.len(), None));
        }
        return Ok((0, None));
    };

    let start = first.start();
    if start != 0 {
        let prefix = data[..start].trim();
        if !prefix.is_empty() {
            return wrapped(start, prefix);
        }
    }

    if let Some(close) = match_brace(data, start + 1) {
        let end = close + 1;
        return Ok((end, Some(Cow::Borrowed(&data[start..end]))));
    }

    if at_eof {
        return wrapped(data.len(), data);
    }
    if let Some(second) = RECORD_START.find_at(data, first.end()) {
        return wrapped(second.start(), &data[..second.start()]);
    }
    if data.len() > MAX_OBJECT_LENGTH {
        return wrapped(MAX_OBJECT_LENGTH, &data[..MAX_OBJECT_LENGTH]);
    }
    Ok((0, None))
}

/// Finds the `}` closing the object whose body starts at `from`.
fn match_brace(data: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = from;
    while i < data.len() {
        match data[i] {
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            b'{' => depth += 1,
            b'"' => i = match_quote(data, i + 1)?,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Finds the `"` closing the string whose body starts at `from`.
fn match_quote(data: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 1,
            b'"' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn split(data: &str, at_eof: bool) -> (usize, Option<String>) {
        let (advance, token) = json_split(data.as_bytes(), at_eof).unwrap();
        (advance, token.map(|t| String::from_utf8(t.into_owned()).unwrap()))
    }

    #[rstest]
    #[case::empty_eof("", true, 0, None)]
    #[case::empty("", false, 0, None)]
    #[case::simple_eof(r#"{"a":1}"#, true, 7, Some(r#"{"a":1}"#))]
    #[case::simple(r#"{"a":1}"#, false, 7, Some(r#"{"a":1}"#))]
    #[case::nested(r#"{"a":{"b":17}}"#, false, 14, Some(r#"{"a":{"b":17}}"#))]
    #[case::indented(r#"  {"a":{"b":17}}"#, false, 16, Some(r#"{"a":{"b":17}}"#))]
    #[case::leading_whitespace(r#"  {"a":1}"#, false, 9, Some(r#"{"a":1}"#))]
    #[case::embedded_quote(
        r#"{"a":"\"I am\", I said"}"#,
        false,
        24,
        Some(r#"{"a":"\"I am\", I said"}"#)
    )]
    #[case::braces_in_string(r#"{"a":"}{"}"#, false, 10, Some(r#"{"a":"}{"}"#))]
    #[case::unmatched_nesting(
        r#"{"a":{"b":17}"#,
        true,
        13,
        Some(r#"{"_msg": "{\"a\":{\"b\":17}"}"#)
    )]
    #[case::unmatched_quote(r#"{"a":"}"#, true, 7, Some(r#"{"_msg": "{\"a\":\"}"}"#))]
    #[case::incomplete(r#"{"a":"#, false, 0, None)]
    #[case::text_before_record(r#"hello {"a":1}"#, false, 6, Some(r#"{"_msg": "hello"}"#))]
    #[case::text_without_record("plain text", false, 0, None)]
    #[case::text_at_eof("  plain text\n", true, 13, Some(r#"{"_msg": "plain text"}"#))]
    #[case::blank_at_eof(" \n ", true, 3, None)]
    #[case::unicode_blank_prefix("\u{2003}\u{3000}{\"a\":1}", false, 13, Some(r#"{"a":1}"#))]
    #[case::unicode_trimmed_text("\u{3000}note\u{2003} {\"a\":1}", false, 11, Some(r#"{"_msg": "note"}"#))]
    #[case::bare_brace_is_text("{1} ", true, 4, Some(r#"{"_msg": "{1}"}"#))]
    fn splits(
        #[case] data: &str,
        #[case] at_eof: bool,
        #[case] advance: usize,
        #[case] token: Option<&str>,
    ) {
        assert_eq!(split(data, at_eof), (advance, token.map(String::from)));
    }

    #[test]
    fn matched_record_is_borrowed() {
        let data = br#"{"a":1}"#;
        let (_, token) = json_split(data, false).unwrap();
        assert!(matches!(token, Some(Cow::Borrowed(_))));
    }

    #[test]
    fn abandons_unclosed_object_at_second_start() {
        let data = r#"junk {"a": [1, 2 {"c":2}"#;
        // The prefix goes first.
        assert_eq!(split(data, false), (5, Some(r#"{"_msg": "junk"}"#.into())));

        let rest = &data[5..];
        let (advance, token) = split(rest, false);
        assert_eq!(advance, rest.find(r#"{"c""#).unwrap());
        assert_eq!(token.unwrap(), r#"{"_msg": "{\"a\": [1, 2 "}"#);

        let rest = &rest[advance..];
        assert_eq!(split(rest, false), (7, Some(r#"{"c":2}"#.into())));
    }

    #[test]
    fn second_start_offset_is_absolute() {
        // The second start lies well past the first match's end.
        let data = r#"{"a": "unterminated          {"b":1}"#;
        let (advance, token) = split(data, false);
        assert_eq!(advance, data.find(r#"{"b""#).unwrap());
        assert!(token.unwrap().starts_with(r#"{"_msg": "{\"a\": \"unterminated"#));
    }

    #[test]
    fn cuts_oversized_object() {
        let data = format!(r#"{{"a":"{}"#, "x".repeat(MAX_OBJECT_LENGTH));
        let (advance, token) = split(&data, false);
        assert_eq!(advance, MAX_OBJECT_LENGTH);
        let token = token.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&token).unwrap();
        assert_eq!(parsed["_msg"].as_str().unwrap(), &data[..MAX_OBJECT_LENGTH]);
    }

    #[test]
    fn short_open_object_waits() {
        let data = format!(r#"{{"a":"{}"#, "x".repeat(MAX_OBJECT_LENGTH - 10));
        assert_eq!(split(&data, false), (0, None));
    }

    #[test]
    fn wrapped_text_is_valid_json() {
        let (_, token) = json_split(b"\x1b[31mred\x1b[0m \"q\" \\ {\"a\":1}", false).unwrap();
        let token = token.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&token).unwrap();
        assert_eq!(parsed["_msg"], "\u{1b}[31mred\u{1b}[0m \"q\" \\");
    }
}
